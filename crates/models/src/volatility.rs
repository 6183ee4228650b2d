//! Realized volatility from a bounded price history.
//!
//! Sample standard deviation of 1-minute log returns, annualized and clamped.

use asymlp_core::{PricePoint, VolatilityConfig};
use statrs::statistics::Statistics;
use std::collections::VecDeque;

/// Bounded ring buffer of recent price points.
#[derive(Debug, Clone)]
pub struct PriceHistory {
    /// Maximum number of points retained.
    capacity: usize,
    points: VecDeque<PricePoint>,
}

impl PriceHistory {
    /// Create an empty history holding at most `capacity` points.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            points: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a point, dropping the oldest when full.
    pub fn push(&mut self, point: PricePoint) {
        if self.points.len() >= self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    /// Points in chronological order.
    pub fn to_vec(&self) -> Vec<PricePoint> {
        self.points.iter().copied().collect()
    }

    pub fn latest(&self) -> Option<PricePoint> {
        self.points.back().copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.points.len() >= self.capacity
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

/// Log returns of consecutive positive prices.
pub fn log_returns(points: &[PricePoint]) -> Vec<f64> {
    points
        .windows(2)
        .filter(|w| w[0].price > 0.0 && w[1].price > 0.0)
        .map(|w| (w[1].price / w[0].price).ln())
        .collect()
}

/// Annualized volatility over the most recent `window_size` points.
///
/// Falls back to `default_volatility` with fewer than two returns.
pub fn annualized_volatility(history: &[PricePoint], config: &VolatilityConfig) -> f64 {
    let start = history.len().saturating_sub(config.window_size);
    let returns = log_returns(&history[start..]);
    if returns.len() < 2 {
        return config.default_volatility;
    }

    let sigma = returns.iter().std_dev();
    if !sigma.is_finite() {
        return config.default_volatility;
    }

    let annualized = sigma * config.minutes_per_year.sqrt();
    annualized.clamp(config.min_volatility, config.max_volatility)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_history(prices: &[f64]) -> Vec<PricePoint> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PricePoint {
                ts_ms: i as i64 * 60_000,
                price,
            })
            .collect()
    }

    #[test]
    fn test_short_history_uses_default() {
        let config = VolatilityConfig::default();
        assert_eq!(annualized_volatility(&[], &config), 0.02);
        assert_eq!(annualized_volatility(&make_history(&[100.0, 101.0]), &config), 0.02);
    }

    #[test]
    fn test_constant_price_clamps_to_min() {
        let config = VolatilityConfig::default();
        let history = make_history(&[100.0; 10]);
        assert_eq!(annualized_volatility(&history, &config), config.min_volatility);
    }

    #[test]
    fn test_known_volatility() {
        let config = VolatilityConfig {
            max_volatility: 100.0,
            ..Default::default()
        };
        // Returns 0.001, 0.002, 0.003: sample stdev 0.001.
        let p1 = 100.0 * 0.001f64.exp();
        let p2 = p1 * 0.002f64.exp();
        let p3 = p2 * 0.003f64.exp();
        let history = make_history(&[100.0, p1, p2, p3]);
        let expected = 0.001 * 525_600f64.sqrt();
        assert_relative_eq!(annualized_volatility(&history, &config), expected, max_relative = 1e-6);
    }

    #[test]
    fn test_wild_prices_clamp_to_max() {
        let config = VolatilityConfig::default();
        let history = make_history(&[100.0, 150.0, 90.0, 160.0, 80.0]);
        assert_eq!(annualized_volatility(&history, &config), config.max_volatility);
    }

    #[test]
    fn test_window_uses_latest_points() {
        let config = VolatilityConfig {
            window_size: 3,
            ..Default::default()
        };
        // Only the last three (constant) points are considered.
        let history = make_history(&[100.0, 150.0, 90.0, 100.0, 100.0, 100.0]);
        assert_eq!(annualized_volatility(&history, &config), config.min_volatility);
    }

    #[test]
    fn test_price_history_is_bounded() {
        let mut history = PriceHistory::new(3);
        for (i, price) in [1.0, 2.0, 3.0, 4.0].into_iter().enumerate() {
            history.push(PricePoint {
                ts_ms: i as i64,
                price,
            });
        }
        assert!(history.is_full());
        let prices: Vec<f64> = history.to_vec().iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![2.0, 3.0, 4.0]);
        assert_eq!(history.latest().map(|p| p.price), Some(4.0));
    }
}
