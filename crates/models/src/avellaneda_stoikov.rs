//! Avellaneda-Stoikov inventory model adapted to LP ranges.
//!
//! `spread = base_spread + gamma * sigma^2 * |skew|` with `skew = ratio - target`.
//! The side holding excess inventory gets half the spread, the other side twice it.

use crate::inventory::{prepare, ModelDiagnostics, ModelInfo, ModelSettings, RangeInputs, RangeRecommendation};
use crate::InventoryModel;
use asymlp_core::{Config, Result, TokenDecimals};
use serde_json::json;
use tracing::debug;

pub const NAME: &str = "AvellanedaStoikovModel";

/// Narrow-side multiplier applied to the spread.
pub const NARROW_FACTOR: f64 = 0.5;
/// Wide-side multiplier applied to the spread.
pub const WIDE_FACTOR: f64 = 2.0;

/// Split a spread into `(range_a, range_b)` by the sign of the skew.
#[inline]
pub(crate) fn asymmetric_split(spread: f64, skew: f64) -> (f64, f64) {
    if skew > 0.0 {
        (spread * NARROW_FACTOR, spread * WIDE_FACTOR)
    } else {
        (spread * WIDE_FACTOR, spread * NARROW_FACTOR)
    }
}

pub struct AvellanedaStoikovModel {
    settings: ModelSettings,
}

impl AvellanedaStoikovModel {
    pub fn new(config: &Config) -> Self {
        Self {
            settings: ModelSettings::from_config(config),
        }
    }

    /// Total spread for a skew and annualized volatility.
    pub fn spread(&self, skew: f64, volatility: f64) -> f64 {
        let params = &self.settings.params;
        params.base_spread + params.risk_aversion * volatility.powi(2) * skew.abs()
    }
}

impl InventoryModel for AvellanedaStoikovModel {
    fn name(&self) -> &str {
        NAME
    }

    fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    fn try_calculate(
        &self,
        inputs: &RangeInputs<'_>,
        decimals: &dyn TokenDecimals,
    ) -> Result<RangeRecommendation> {
        let prepared = prepare(inputs, decimals, &self.settings)?;
        let skew = prepared.snapshot.ratio - prepared.target;
        let spread = self.spread(skew, prepared.volatility);
        let (raw_a, raw_b) = asymmetric_split(spread, skew);
        let (range_a, range_b) = self.settings.clamp_ranges(NAME, raw_a, raw_b);

        debug!(
            skew,
            volatility = prepared.volatility,
            range_a,
            range_b,
            "AS ranges calculated"
        );

        let params = &self.settings.params;
        Ok(RangeRecommendation {
            model_name: NAME.to_string(),
            range_a_percentage: range_a,
            range_b_percentage: range_b,
            inventory_ratio: prepared.snapshot.ratio,
            target_ratio: prepared.target,
            deviation: prepared.deviation,
            volatility: prepared.volatility,
            fallback_used: false,
            diagnostics: ModelDiagnostics::AvellanedaStoikov {
                risk_aversion: params.risk_aversion,
                base_spread: params.base_spread,
                volatility_window: self.settings.volatility.window_size,
                skew,
                spread,
            },
        })
    }

    fn model_info(&self) -> ModelInfo {
        let params = &self.settings.params;
        let vol = &self.settings.volatility;
        ModelInfo {
            name: "Avellaneda-Stoikov Model".to_string(),
            description: "Classic market making model adapted for concentrated liquidity ranges"
                .to_string(),
            version: "1.0.0".to_string(),
            parameters: json!({
                "inventory_risk_aversion": params.risk_aversion,
                "target_inventory_ratio": params.target_inventory_ratio,
                "max_inventory_deviation": params.max_inventory_deviation,
                "base_spread": params.base_spread,
                "volatility_window_size": vol.window_size,
                "default_volatility": vol.default_volatility,
                "max_volatility": vol.max_volatility,
                "min_volatility": vol.min_volatility,
            }),
            features: vec![
                "Dynamic range calculation based on inventory imbalance".to_string(),
                "Volatility-adjusted spreads".to_string(),
                "Min/max range constraints".to_string(),
                "Risk aversion parameter".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asymlp_core::{FixedDecimals, PricePoint};

    fn make_inputs<'a>(t0: f64, t1: f64, price: f64, history: &'a [PricePoint]) -> RangeInputs<'a> {
        RangeInputs {
            token0_balance: t0 * 1e18,
            token1_balance: t1 * 1e18,
            spot_price: price,
            price_history: history,
            token0_address: "0xa",
            token1_address: "0xb",
        }
    }

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
    fn test_balanced_inventory() {
        let model = AvellanedaStoikovModel::new(&Config::default());
        let rec = model.calculate_lp_ranges(&make_inputs(1.0, 3000.0, 3000.0, &[]), &FixedDecimals(18));

        assert!(!rec.fallback_used);
        assert_eq!(rec.inventory_ratio, 0.5);
        assert_eq!(rec.deviation, 0.0);
        // Zero skew: spread = base 0.05, token0 side wide.
        assert!((rec.range_a_percentage - 0.10).abs() < 1e-12);
        assert!((rec.range_b_percentage - 0.025).abs() < 1e-12);
        assert!(rec.range_a_percentage >= 0.02 && rec.range_a_percentage <= 0.50);
        assert!(rec.range_b_percentage >= 0.02 && rec.range_b_percentage <= 0.50);
    }

    #[test]
    fn test_excess_token0_narrows_range_a() {
        let model = AvellanedaStoikovModel::new(&Config::default());
        let rec = model.calculate_lp_ranges(&make_inputs(3.0, 3000.0, 3000.0, &[]), &FixedDecimals(18));
        assert!(rec.inventory_ratio > 0.5);
        assert!(rec.range_a_percentage < rec.range_b_percentage);
    }

    #[test]
    fn test_spread_grows_with_volatility() {
        let model = AvellanedaStoikovModel::new(&Config::default());
        let calm = make_history(&[3000.0, 3000.1, 3000.0, 3000.1, 3000.0]);
        let wild = make_history(&[3000.0, 3060.0, 2990.0, 3080.0, 2970.0]);

        let rec_calm = model.calculate_lp_ranges(&make_inputs(3.0, 3000.0, 3000.0, &calm), &FixedDecimals(18));
        let rec_wild = model.calculate_lp_ranges(&make_inputs(3.0, 3000.0, 3000.0, &wild), &FixedDecimals(18));

        assert!(rec_wild.volatility > rec_calm.volatility);
        assert!(rec_wild.range_b_percentage > rec_calm.range_b_percentage);
    }

    #[test]
    fn test_negative_balance_falls_back() {
        let model = AvellanedaStoikovModel::new(&Config::default());
        let rec = model.calculate_lp_ranges(&make_inputs(-1.0, 3000.0, 3000.0, &[]), &FixedDecimals(18));
        assert!(rec.fallback_used);
        assert_eq!(rec.range_a_percentage, 0.02);
        assert_eq!(rec.range_b_percentage, 0.02);
        assert!(rec.error().is_some());
    }

    #[test]
    fn test_ranges_always_within_bounds() {
        let model = AvellanedaStoikovModel::new(&Config::default());
        let wild = make_history(&[3000.0, 6000.0, 1500.0, 6000.0, 1500.0]);
        for (t0, t1) in [(0.0, 1.0), (1.0, 0.0), (100.0, 1.0), (0.0, 0.0)] {
            let rec = model.calculate_lp_ranges(&make_inputs(t0, t1, 3000.0, &wild), &FixedDecimals(18));
            assert!(rec.range_a_percentage >= 0.02 && rec.range_a_percentage <= 0.50);
            assert!(rec.range_b_percentage >= 0.02 && rec.range_b_percentage <= 0.50);
        }
    }
}
