//! Backtest engine.
//!
//! Replays a bar series through the AMM simulator and rebalances the two
//! bands whenever either token is depleted past the strategy threshold.

use crate::metrics::{MetricsCalculator, ValuePoint};
use crate::position::PositionTracker;
use crate::results::{BacktestResult, RebalanceRecord, TradeRecord};
use asymlp_amm::AmmSimulator;
use asymlp_core::{
    inventory_ratio, ts_to_datetime, AllocationMode, BarSeries, Config, Error, FixedDecimals,
    OhlcBar, Result,
};
use asymlp_models::{ModelFactory, PriceHistory};
use asymlp_strategy::{AsymmetricLpStrategy, PlanRequest, RebalanceBaseline};
use std::sync::Arc;
use tracing::{debug, info};

/// Backtest engine.
pub struct BacktestEngine {
    config: Config,
    factory: ModelFactory,
}

impl BacktestEngine {
    /// Create an engine with the built-in models.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_factory(config, ModelFactory::with_builtin_models())
    }

    /// Create an engine resolving the configured model in `factory`.
    pub fn with_factory(config: Config, factory: ModelFactory) -> Result<Self> {
        config.validate()?;
        let model = &config.strategy.inventory_model;
        if !factory.contains(model) {
            return Err(Error::unknown_model(model.clone(), factory.names()));
        }
        Ok(Self { config, factory })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn factory(&self) -> &ModelFactory {
        &self.factory
    }

    /// Run one backtest. Every run starts from an empty pool and history.
    pub fn run(
        &self,
        bars: &BarSeries,
        initial_balance_0: f64,
        initial_balance_1: f64,
    ) -> Result<BacktestResult> {
        for (name, balance) in [("token0", initial_balance_0), ("token1", initial_balance_1)] {
            if !(balance.is_finite() && balance >= 0.0) {
                return Err(Error::invalid_input(format!(
                    "initial {name} balance must be finite and non-negative, got {balance}"
                )));
            }
        }

        let first = bars.first();
        let initial_target_ratio = inventory_ratio(initial_balance_0, initial_balance_1, first.close);

        let mut model_config = self.config.clone();
        model_config.model.target_inventory_ratio = initial_target_ratio;
        let model = self
            .factory
            .create(&self.config.strategy.inventory_model, &model_config)?;
        let strategy = AsymmetricLpStrategy::new(
            self.config.strategy.clone(),
            model,
            Arc::new(FixedDecimals(self.config.backtest.token_decimals)),
        );

        info!(
            model = strategy.model().name(),
            bars = bars.len(),
            initial_balance_0,
            initial_balance_1,
            initial_target_ratio,
            "Starting backtest"
        );

        let mut run = RunState {
            config: &self.config,
            strategy: &strategy,
            amm: AmmSimulator::new(&self.config.pool),
            history: PriceHistory::new(self.config.backtest.price_history_size),
            positions: PositionTracker::new(),
            initial_balances: (initial_balance_0, initial_balance_1),
            initial_target_ratio,
            balances: (initial_balance_0, initial_balance_1),
            baseline: None,
            active_widths: (0.0, 0.0),
            trades: Vec::new(),
            rebalances: Vec::new(),
            values: Vec::with_capacity(bars.len()),
        };

        for bar in bars {
            run.process_bar(bar)?;
        }

        let result = run.finish(bars);

        info!(
            total_return = result.metrics.total_return,
            token0_return = result.metrics.token0_return,
            token1_return = result.metrics.token1_return,
            token0_drawdown = result.metrics.token0_drawdown,
            token1_drawdown = result.metrics.token1_drawdown,
            rebalances = result.total_rebalances,
            trades = result.total_trades,
            "Backtest completed"
        );

        Ok(result)
    }
}

/// Mutable state of a single run.
struct RunState<'a> {
    config: &'a Config,
    strategy: &'a AsymmetricLpStrategy,
    amm: AmmSimulator,
    history: PriceHistory,
    positions: PositionTracker,
    initial_balances: (f64, f64),
    initial_target_ratio: f64,
    /// Mirror of the strategy's holdings, deployed liquidity included.
    balances: (f64, f64),
    baseline: Option<RebalanceBaseline>,
    /// Widths of the bands currently minted.
    active_widths: (f64, f64),
    trades: Vec<TradeRecord>,
    rebalances: Vec<RebalanceRecord>,
    values: Vec<ValuePoint>,
}

impl RunState<'_> {
    fn process_bar(&mut self, bar: &OhlcBar) -> Result<()> {
        let price = bar.close;
        self.history.push(bar.price_point());

        if let Some(event) = self.amm.compute(bar) {
            if let Some(swap) = self.amm.last_swap() {
                self.positions.record_fees(swap);
            }
            self.balances = (event.new_token0_balance, event.new_token1_balance);
            self.trades
                .push(TradeRecord::from_event(&event, self.active_widths));
        }

        if self.strategy.should_rebalance(
            price,
            self.balances,
            self.baseline.as_ref(),
            self.positions.has_positions(),
        ) {
            self.rebalance(bar)?;
        }

        self.values.push(ValuePoint {
            ts_ms: bar.ts_ms,
            price,
            value: self.balances.0 * price + self.balances.1,
        });
        Ok(())
    }

    fn rebalance(&mut self, bar: &OhlcBar) -> Result<()> {
        let price = bar.close;
        let (token0, token1) = if self.amm.has_active_positions() {
            self.amm.active_positions_balances()
        } else {
            self.balances
        };
        let is_initial_mint = self.rebalances.is_empty();

        self.amm.clear_all_positions();
        let positions_burned = self.positions.burn_all();

        let history = self.history.to_vec();
        let plan = self.strategy.plan_rebalance(&PlanRequest {
            current_price: price,
            price_history: &history,
            token0_balance: token0,
            token1_balance: token1,
            initial_target_ratio: self.initial_target_ratio,
            initial_units: Some(self.initial_balances),
            startup_allocation: is_initial_mint,
        })?;

        let mint = if plan.token0_amount > 0.0 || plan.token1_amount > 0.0 {
            Some(self.amm.mint_bands_percent(
                price,
                plan.range_a_pct,
                plan.range_b_pct,
                plan.token0_amount,
                plan.token1_amount,
            )?)
        } else {
            debug!(ts_ms = bar.ts_ms, "Nothing to deploy");
            None
        };
        let new_positions = match &mint {
            Some(mint) => self.positions.open_from_mint(mint, bar.ts_ms),
            None => 0,
        };

        self.balances = if self.amm.has_active_positions() {
            self.amm.active_positions_balances()
        } else {
            (plan.token0_amount, plan.token1_amount)
        };
        self.baseline = Some(RebalanceBaseline {
            token0: self.balances.0,
            token1: self.balances.1,
            price,
        });
        self.active_widths = (plan.range_a_pct, plan.range_b_pct);

        info!(
            ts_ms = bar.ts_ms,
            price,
            range_a = plan.range_a_pct,
            range_b = plan.range_b_pct,
            token0 = plan.token0_amount,
            token1 = plan.token1_amount,
            positions_burned,
            new_positions,
            is_initial_mint,
            "Rebalanced"
        );

        let (upper_band_price, lower_band_price) = RebalanceRecord::band_prices(mint.as_ref());
        let target_units = match self.config.strategy.allocation {
            AllocationMode::InitialUnits => Some(self.initial_balances),
            _ => None,
        };
        self.rebalances.push(RebalanceRecord {
            ts_ms: bar.ts_ms,
            timestamp: ts_to_datetime(bar.ts_ms),
            price,
            positions_burned,
            new_positions,
            is_initial_mint,
            range_a_pct: plan.range_a_pct,
            range_b_pct: plan.range_b_pct,
            token0_deployed: plan.token0_amount,
            token1_deployed: plan.token1_amount,
            upper_band_price,
            lower_band_price,
            recommendation: plan.recommendation,
            target_units,
        });
        Ok(())
    }

    fn finish(self, bars: &BarSeries) -> BacktestResult {
        let final_balances = if self.amm.has_active_positions() {
            self.amm.active_positions_balances()
        } else {
            self.balances
        };

        let calculator = MetricsCalculator::new(self.initial_balances, self.initial_target_ratio);
        let metrics = calculator.calculate(&self.values, final_balances, &self.trades);

        BacktestResult {
            model_name: self.strategy.model().name().to_string(),
            start_time: ts_to_datetime(bars.first().ts_ms),
            end_time: ts_to_datetime(bars.last().ts_ms),
            initial_balance_0: self.initial_balances.0,
            initial_balance_1: self.initial_balances.1,
            final_balance_0: final_balances.0,
            final_balance_1: final_balances.1,
            initial_target_ratio: self.initial_target_ratio,
            total_rebalances: self.rebalances.len(),
            total_trades: self.trades.len(),
            trades: self.trades,
            rebalances: self.rebalances,
            metrics,
            final_positions: self.positions.positions().to_vec(),
            portfolio_values: self.values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(model: &str) -> Config {
        let mut config = Config::default();
        config.strategy.inventory_model = model.to_string();
        config
    }

    fn make_series(prices: &[f64]) -> BarSeries {
        let points: Vec<(i64, f64)> = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| (i as i64 * 60_000, p))
            .collect();
        BarSeries::from_closes(&points).unwrap()
    }

    #[test]
    fn test_unknown_model_rejected() {
        let err = BacktestEngine::new(make_config("NoSuchModel")).err().unwrap();
        assert!(matches!(err, Error::UnknownModel { .. }));
    }

    #[test]
    fn test_negative_balance_rejected() {
        let engine = BacktestEngine::new(Config::default()).unwrap();
        let bars = make_series(&[3000.0, 3010.0]);
        assert!(matches!(
            engine.run(&bars, -1.0, 3000.0),
            Err(Error::InvalidInput(_))
        ));
        assert!(engine.run(&bars, 1.0, f64::NAN).is_err());
    }

    #[test]
    fn test_initial_mint_on_first_bar() {
        let engine = BacktestEngine::new(make_config("SimpleModel")).unwrap();
        let result = engine.run(&make_series(&[3000.0]), 1.0, 3000.0).unwrap();

        assert_eq!(result.total_rebalances, 1);
        assert_eq!(result.total_trades, 0);
        assert!(result.rebalances[0].is_initial_mint);
        assert_eq!(result.rebalances[0].positions_burned, 0);
        assert_eq!(result.rebalances[0].new_positions, 2);
        assert_eq!(result.final_positions.len(), 2);
        assert!((result.initial_target_ratio - 0.5).abs() < 1e-12);
        assert!((result.final_balance_0 - 1.0).abs() < 1e-12);
        assert!((result.final_balance_1 - 3000.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_prices_never_trade() {
        let engine = BacktestEngine::new(Config::default()).unwrap();
        let result = engine
            .run(&make_series(&[3000.0, 3000.0, 3000.0, 3000.0]), 1.0, 3000.0)
            .unwrap();

        assert_eq!(result.total_trades, 0);
        assert_eq!(result.total_rebalances, 1);
        assert_eq!(result.portfolio_values.len(), 4);
        assert!(result.metrics.total_return.abs() < 1e-12);
        assert_eq!(result.metrics.token1_drawdown, 0.0);
    }

    #[test]
    fn test_sub_threshold_moves_accumulate() {
        let mut config = Config::default();
        config.pool.trade_detection_threshold = 0.01;
        let engine = BacktestEngine::new(config).unwrap();

        // 0.4% steps: the third step crosses 1% from the mint price.
        let result = engine
            .run(&make_series(&[3000.0, 3012.0, 3024.0, 3036.0]), 1.0, 3000.0)
            .unwrap();

        assert_eq!(result.total_trades, 1);
        assert_eq!(result.trades[0].ts_ms, 180_000);
        assert!((result.trades[0].price_change - 0.012).abs() < 1e-12);
    }

    #[test]
    fn test_price_rise_sells_token0_and_earns_fees() {
        let engine = BacktestEngine::new(make_config("SimpleModel")).unwrap();
        let result = engine
            .run(&make_series(&[3000.0, 3030.0, 3060.0]), 1.0, 3000.0)
            .unwrap();

        assert_eq!(result.total_trades, 2);
        assert!(result.trades.iter().all(|t| t.sold_token0 > 0.0));
        assert!(result.final_balance_0 < 1.0);
        assert!(result.final_balance_1 > 3000.0);
        assert!(result.metrics.total_fees > 0.0);

        let fees0: f64 = result.final_positions.iter().map(|p| p.fees_collected_0).sum();
        let trade_fees0: f64 = result
            .trades
            .iter()
            .filter(|t| t.ts_ms > result.rebalances.last().map_or(0, |r| r.ts_ms))
            .map(|t| t.fees_token0)
            .sum();
        assert!((fees0 - trade_fees0).abs() < 1e-12);
    }

    #[test]
    fn test_trade_carries_active_widths() {
        let engine = BacktestEngine::new(Config::default()).unwrap();
        let result = engine.run(&make_series(&[3000.0, 3015.0]), 1.0, 3000.0).unwrap();

        let mint = &result.rebalances[0];
        let trade = &result.trades[0];
        assert_eq!(trade.range_a_pct, mint.range_a_pct);
        assert_eq!(trade.range_b_pct, mint.range_b_pct);
    }

    #[test]
    fn test_depletion_triggers_rebalance() {
        let mut config = make_config("SimpleModel");
        config.strategy.rebalance_threshold = 0.05;
        let engine = BacktestEngine::new(config).unwrap();

        let result = engine
            .run(&make_series(&[3000.0, 3030.0, 3060.0, 3090.0]), 1.0, 3000.0)
            .unwrap();

        assert!(result.total_rebalances >= 2);
        let second = &result.rebalances[1];
        assert!(!second.is_initial_mint);
        assert_eq!(second.positions_burned, 2);
        // A trade always precedes the rebalance it caused.
        let timeline = result.timeline();
        let idx = timeline
            .iter()
            .position(|e| matches!(e, crate::results::TimelineEntry::Rebalance(r) if !r.is_initial_mint))
            .unwrap();
        assert!(matches!(timeline[idx - 1], crate::results::TimelineEntry::Trade(_)));
    }

    #[test]
    fn test_narrow_ranges_on_tick_grid_price() {
        let mut config = make_config("SimpleModel");
        config.ranges.min_range_percentage = 1e-5;
        config.ranges.max_range_percentage = 1e-5;
        let engine = BacktestEngine::new(config).unwrap();
        let start = asymlp_amm::tick_to_price(80_000);

        let result = engine.run(&make_series(&[start, start * 1.01]), 1.0, start).unwrap();

        assert_eq!(result.rebalances[0].new_positions, 2);
        assert!(result.rebalances[0].upper_band_price.unwrap() > start);
        assert!(result.rebalances[0].lower_band_price.unwrap() < start);
        assert_eq!(result.total_trades, 1);
    }

    #[test]
    fn test_runs_are_isolated() {
        let engine = BacktestEngine::new(Config::default()).unwrap();
        let bars = make_series(&[3000.0, 3030.0, 2990.0, 3050.0]);
        let a = engine.run(&bars, 1.0, 3000.0).unwrap();
        let b = engine.run(&bars, 1.0, 3000.0).unwrap();
        assert_eq!(a.total_trades, b.total_trades);
        assert_eq!(a.final_balance_0, b.final_balance_0);
        assert_eq!(a.final_balance_1, b.final_balance_1);
    }

    #[test]
    fn test_empty_portfolio_deploys_nothing() {
        let engine = BacktestEngine::new(Config::default()).unwrap();
        let result = engine.run(&make_series(&[3000.0, 3100.0]), 0.0, 0.0).unwrap();
        assert_eq!(result.total_trades, 0);
        assert!(result.final_positions.is_empty());
        assert_eq!(result.metrics.total_return, 0.0);
        assert!((result.initial_target_ratio - 0.5).abs() < 1e-12);
    }
}
