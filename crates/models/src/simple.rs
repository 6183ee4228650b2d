//! Simple inventory model.
//!
//! A constant base width, narrowed on the side holding excess inventory and
//! widened on the other, linearly in the deviation from target.

use crate::inventory::{prepare, ModelDiagnostics, ModelInfo, ModelSettings, RangeInputs, RangeRecommendation};
use crate::InventoryModel;
use asymlp_core::{Config, Result, TokenDecimals};
use serde_json::json;
use tracing::debug;

pub const NAME: &str = "SimpleModel";

pub struct SimpleModel {
    settings: ModelSettings,
}

impl SimpleModel {
    pub fn new(config: &Config) -> Self {
        Self {
            settings: ModelSettings::from_config(config),
        }
    }

    /// Raw (unclamped) widths for a given ratio.
    pub fn widths(&self, ratio: f64, target: f64) -> (f64, f64) {
        let base = self.settings.params.simple_base_range;
        let shift = (ratio - target).abs() * self.settings.params.simple_inventory_sensitivity;
        if ratio > target {
            // Too much token0: tighten the token0 band to sell it faster.
            (base * (1.0 - shift), base * (1.0 + shift))
        } else {
            (base * (1.0 + shift), base * (1.0 - shift))
        }
    }
}

impl InventoryModel for SimpleModel {
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
        let ratio = prepared.snapshot.ratio;
        let (raw_a, raw_b) = self.widths(ratio, prepared.target);
        let (range_a, range_b) = self.settings.clamp_ranges(NAME, raw_a, raw_b);

        debug!(ratio, deviation = prepared.deviation, range_a, range_b, "Simple ranges calculated");

        Ok(RangeRecommendation {
            model_name: NAME.to_string(),
            range_a_percentage: range_a,
            range_b_percentage: range_b,
            inventory_ratio: ratio,
            target_ratio: prepared.target,
            deviation: prepared.deviation,
            volatility: prepared.volatility,
            fallback_used: false,
            diagnostics: ModelDiagnostics::Simple {
                base_range: self.settings.params.simple_base_range,
                inventory_sensitivity: self.settings.params.simple_inventory_sensitivity,
            },
        })
    }

    fn model_info(&self) -> ModelInfo {
        let params = &self.settings.params;
        ModelInfo {
            name: "Simple Model".to_string(),
            description: "Linear range adjustment from inventory deviation".to_string(),
            version: "1.0.0".to_string(),
            parameters: json!({
                "base_range": params.simple_base_range,
                "inventory_sensitivity": params.simple_inventory_sensitivity,
                "target_inventory_ratio": params.target_inventory_ratio,
            }),
            features: vec![
                "Inventory-based range adjustment".to_string(),
                "Min/max range constraints".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asymlp_core::FixedDecimals;

    fn make_inputs(t0: f64, t1: f64, price: f64) -> RangeInputs<'static> {
        RangeInputs {
            token0_balance: t0 * 1e18,
            token1_balance: t1 * 1e18,
            spot_price: price,
            price_history: &[],
            token0_address: "0xa",
            token1_address: "0xb",
        }
    }

    #[test]
    fn test_balanced_uses_base_range() {
        let model = SimpleModel::new(&Config::default());
        let rec = model.calculate_lp_ranges(&make_inputs(1.0, 3000.0, 3000.0), &FixedDecimals(18));
        assert!(!rec.fallback_used);
        assert!((rec.range_a_percentage - 0.05).abs() < 1e-12);
        assert!((rec.range_b_percentage - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_excess_token0_narrows_upper_band() {
        let model = SimpleModel::new(&Config::default());
        // ratio = 0.6 -> shift = 0.2
        let rec = model.calculate_lp_ranges(&make_inputs(1.5, 3000.0, 3000.0), &FixedDecimals(18));
        assert!((rec.inventory_ratio - 0.6).abs() < 1e-12);
        assert!((rec.range_a_percentage - 0.04).abs() < 1e-9);
        assert!((rec.range_b_percentage - 0.06).abs() < 1e-9);
    }

    #[test]
    fn test_excess_token1_narrows_lower_band() {
        let model = SimpleModel::new(&Config::default());
        // ratio = 0.25 -> shift = 0.5
        let rec = model.calculate_lp_ranges(&make_inputs(1.0, 9000.0, 3000.0), &FixedDecimals(18));
        assert!(rec.range_a_percentage > rec.range_b_percentage);
        assert!((rec.range_a_percentage - 0.075).abs() < 1e-9);
        assert!((rec.range_b_percentage - 0.025).abs() < 1e-9);
    }

    #[test]
    fn test_extreme_skew_clamps_to_min() {
        let model = SimpleModel::new(&Config::default());
        let rec = model.calculate_lp_ranges(&make_inputs(1.0, 0.0, 3000.0), &FixedDecimals(18));
        assert_eq!(rec.range_a_percentage, 0.02);
        assert!((rec.range_b_percentage - 0.10).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_price_falls_back() {
        let model = SimpleModel::new(&Config::default());
        let rec = model.calculate_lp_ranges(&make_inputs(1.0, 1.0, -5.0), &FixedDecimals(18));
        assert!(rec.fallback_used);
        assert_eq!(rec.range_a_percentage, 0.02);
    }
}
