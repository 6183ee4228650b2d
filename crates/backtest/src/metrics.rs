//! Backtest performance metrics.
//!
//! Returns, inventory drift and per-denomination drawdowns from the
//! bar-by-bar portfolio value series.

use crate::results::TradeRecord;
use asymlp_core::{inventory_ratio, TimestampMs};
use serde::{Deserialize, Serialize};

/// Backtest performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Portfolio value at the first close (token1 units).
    pub initial_value: f64,
    /// Portfolio value at the last close (token1 units).
    pub final_value: f64,
    /// `(final_value - initial_value) / initial_value`.
    pub total_return: f64,
    /// Change in token0 units relative to the initial token0 balance.
    pub token0_return: f64,
    /// Change in token1 units relative to the initial token1 balance.
    pub token1_return: f64,
    /// Token0 share of the final portfolio value.
    pub final_inventory_ratio: f64,
    /// `|final_inventory_ratio - initial_target_ratio|`.
    pub final_inventory_deviation: f64,
    /// Max drawdown of the value denominated in token0 (fraction).
    pub token0_drawdown: f64,
    /// Max drawdown of the value denominated in token1 (fraction).
    pub token1_drawdown: f64,
    /// Swap fees earned, in token1 units at each swap's price.
    pub total_fees: f64,
    /// Swapped volume in token0 units.
    pub total_volume: f64,
}

/// Portfolio value recorded at the end of a bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuePoint {
    pub ts_ms: TimestampMs,
    pub price: f64,
    /// `balance0·price + balance1`.
    pub value: f64,
}

/// Unit an equity curve is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denomination {
    Token0,
    Token1,
}

impl ValuePoint {
    #[inline]
    pub fn value_in(&self, denomination: Denomination) -> f64 {
        match denomination {
            Denomination::Token0 => self.value / self.price,
            Denomination::Token1 => self.value,
        }
    }
}

/// Equity curve point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityPoint {
    pub ts_ms: TimestampMs,
    pub equity: f64,
    /// Absolute distance below the running peak.
    pub drawdown: f64,
    /// Drawdown as a fraction of the running peak.
    pub drawdown_fraction: f64,
}

/// Metrics calculator.
pub struct MetricsCalculator {
    initial_balance_0: f64,
    initial_balance_1: f64,
    initial_target_ratio: f64,
}

impl MetricsCalculator {
    pub fn new(initial_balances: (f64, f64), initial_target_ratio: f64) -> Self {
        Self {
            initial_balance_0: initial_balances.0,
            initial_balance_1: initial_balances.1,
            initial_target_ratio,
        }
    }

    /// Calculate metrics from the value series, the final balances and the trade log.
    pub fn calculate(
        &self,
        values: &[ValuePoint],
        final_balances: (f64, f64),
        trades: &[TradeRecord],
    ) -> PerformanceMetrics {
        let (first, last) = match (values.first(), values.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return PerformanceMetrics::default(),
        };

        let mut metrics = PerformanceMetrics::default();
        let (final0, final1) = final_balances;

        metrics.initial_value = self.initial_balance_0 * first.price + self.initial_balance_1;
        metrics.final_value = final0 * last.price + final1;
        metrics.total_return = relative_change(metrics.initial_value, metrics.final_value);
        metrics.token0_return = relative_change(self.initial_balance_0, final0);
        metrics.token1_return = relative_change(self.initial_balance_1, final1);

        metrics.final_inventory_ratio = inventory_ratio(final0, final1, last.price);
        metrics.final_inventory_deviation =
            (metrics.final_inventory_ratio - self.initial_target_ratio).abs();

        metrics.token0_drawdown = max_drawdown(&self.build_equity_curve(values, Denomination::Token0));
        metrics.token1_drawdown = max_drawdown(&self.build_equity_curve(values, Denomination::Token1));

        for trade in trades {
            metrics.total_fees += trade.fees_earned;
            metrics.total_volume += trade.volume;
        }

        metrics
    }

    /// Build an equity curve from the value series.
    pub fn build_equity_curve(
        &self,
        values: &[ValuePoint],
        denomination: Denomination,
    ) -> Vec<EquityPoint> {
        let mut curve = Vec::with_capacity(values.len());
        let mut peak = f64::MIN;

        for point in values {
            let equity = point.value_in(denomination);
            peak = peak.max(equity);

            let drawdown = peak - equity;
            let drawdown_fraction = if peak > 0.0 { drawdown / peak } else { 0.0 };

            curve.push(EquityPoint {
                ts_ms: point.ts_ms,
                equity,
                drawdown,
                drawdown_fraction,
            });
        }

        curve
    }
}

/// Largest drawdown fraction along a curve.
pub fn max_drawdown(curve: &[EquityPoint]) -> f64 {
    curve
        .iter()
        .map(|p| p.drawdown_fraction)
        .fold(0.0, f64::max)
}

#[inline]
fn relative_change(initial: f64, current: f64) -> f64 {
    if initial > 0.0 {
        (current - initial) / initial
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asymlp_core::TradeType;

    fn make_value(ts_ms: i64, price: f64, value: f64) -> ValuePoint {
        ValuePoint { ts_ms, price, value }
    }

    fn make_trade(volume: f64, fees_earned: f64) -> TradeRecord {
        TradeRecord {
            ts_ms: 0,
            timestamp: asymlp_core::ts_to_datetime(0),
            trade_type: TradeType::Buy,
            price: 100.0,
            price_change: 0.01,
            volume,
            sold_token0: volume,
            bought_token0: 0.0,
            sold_token1: 0.0,
            bought_token1: volume * 100.0,
            fees_token0: fees_earned / 100.0,
            fees_token1: 0.0,
            fees_earned,
            token0_balance_after: 0.0,
            token1_balance_after: 0.0,
            range_a_pct: 0.05,
            range_b_pct: 0.05,
        }
    }

    #[test]
    fn test_returns() {
        let calculator = MetricsCalculator::new((1.0, 100.0), 0.5);
        let values = vec![make_value(0, 100.0, 200.0), make_value(60_000, 110.0, 215.0)];

        let metrics = calculator.calculate(&values, (0.5, 160.0), &[]);

        assert!((metrics.initial_value - 200.0).abs() < 1e-10);
        assert!((metrics.final_value - 215.0).abs() < 1e-10);
        assert!((metrics.total_return - 0.075).abs() < 1e-10);
        assert!((metrics.token0_return + 0.5).abs() < 1e-10);
        assert!((metrics.token1_return - 0.6).abs() < 1e-10);
        // 55 / 215 of the value sits in token0.
        assert!((metrics.final_inventory_ratio - 55.0 / 215.0).abs() < 1e-10);
        assert!((metrics.final_inventory_deviation - (0.5 - 55.0 / 215.0)).abs() < 1e-10);
    }

    #[test]
    fn test_zero_initial_balance_return() {
        let calculator = MetricsCalculator::new((0.0, 100.0), 0.0);
        let values = vec![make_value(0, 100.0, 100.0)];
        let metrics = calculator.calculate(&values, (0.2, 80.0), &[]);
        assert_eq!(metrics.token0_return, 0.0);
        assert!((metrics.token1_return + 0.2).abs() < 1e-10);
    }

    #[test]
    fn test_empty_values() {
        let calculator = MetricsCalculator::new((1.0, 100.0), 0.5);
        let metrics = calculator.calculate(&[], (1.0, 100.0), &[]);
        assert_eq!(metrics, PerformanceMetrics::default());
    }

    #[test]
    fn test_equity_curve() {
        let calculator = MetricsCalculator::new((1.0, 100.0), 0.5);
        let values = vec![
            make_value(0, 100.0, 200.0),
            make_value(60_000, 100.0, 220.0),
            make_value(120_000, 100.0, 165.0), // Creates drawdown
            make_value(180_000, 100.0, 230.0),
        ];

        let curve = calculator.build_equity_curve(&values, Denomination::Token1);

        assert_eq!(curve.len(), 4);
        assert!((curve[1].equity - 220.0).abs() < 1e-10);
        assert!((curve[2].drawdown - 55.0).abs() < 1e-10);
        assert!((curve[2].drawdown_fraction - 0.25).abs() < 1e-10);
        assert_eq!(curve[3].drawdown, 0.0);
        assert!((max_drawdown(&curve) - 0.25).abs() < 1e-10);
    }

    #[test]
    fn test_drawdown_depends_on_denomination() {
        // Value in token1 only rises while token0 value falls as the price doubles.
        let calculator = MetricsCalculator::new((1.0, 100.0), 0.5);
        let values = vec![make_value(0, 100.0, 200.0), make_value(60_000, 200.0, 300.0)];

        let metrics = calculator.calculate(&values, (1.0, 100.0), &[]);

        assert_eq!(metrics.token1_drawdown, 0.0);
        // 2.0 -> 1.5 token0.
        assert!((metrics.token0_drawdown - 0.25).abs() < 1e-10);
    }

    #[test]
    fn test_fees_and_volume_summed() {
        let calculator = MetricsCalculator::new((1.0, 100.0), 0.5);
        let values = vec![make_value(0, 100.0, 200.0)];
        let trades = vec![make_trade(0.5, 0.15), make_trade(0.25, 0.075)];

        let metrics = calculator.calculate(&values, (1.0, 100.0), &trades);

        assert!((metrics.total_fees - 0.225).abs() < 1e-12);
        assert!((metrics.total_volume - 0.75).abs() < 1e-12);
    }
}
