//! Guéant-Lehalle-Fernandez-Tapia inventory model.
//!
//! Extends the Avellaneda-Stoikov spread with an execution cost, a linear
//! holding penalty and a quadratic terminal penalty. With the finite-inventory
//! constraint active, ranges shrink as normalized inventory nears its limit.

use crate::avellaneda_stoikov::asymmetric_split;
use crate::inventory::{prepare, ModelDiagnostics, ModelInfo, ModelSettings, RangeInputs, RangeRecommendation};
use crate::InventoryModel;
use asymlp_core::{Config, Result, TokenDecimals};
use serde_json::json;
use tracing::debug;

pub const NAME: &str = "GLFTModel";

pub struct GlftModel {
    settings: ModelSettings,
}

impl GlftModel {
    pub fn new(config: &Config) -> Self {
        Self {
            settings: ModelSettings::from_config(config),
        }
    }

    /// Total spread for a skew of normalized token0 inventory.
    pub fn spread(&self, skew: f64, volatility: f64) -> f64 {
        let p = &self.settings.params;
        let base = p.base_spread + p.execution_cost;
        let inventory_risk =
            p.risk_aversion * volatility.powi(2) * skew.abs() + p.inventory_penalty * skew.abs();
        let terminal = p.terminal_inventory_penalty * skew.powi(2);
        base + inventory_risk + terminal
    }

    /// Shrink a range linearly once the inventory level is within
    /// `max_position_size` of either end of `[0, 1]`.
    fn distance_to_limit_scale(&self, range: f64, inventory_level: f64) -> f64 {
        let max_pos = self.settings.params.max_position_size;
        let distance = inventory_level.min(1.0 - inventory_level);
        if distance < max_pos {
            let scaled = range * (distance.max(0.0) / max_pos);
            debug!(range, scaled, inventory_level, distance, "Applied finite inventory constraint");
            scaled
        } else {
            range
        }
    }

    /// Raw widths before clamping, with constraints applied when active.
    pub fn widths(&self, n0: f64, n1: f64, volatility: f64) -> (f64, f64, f64) {
        let p = &self.settings.params;
        let skew = n0 - p.target_inventory_ratio;
        let spread = self.spread(skew, volatility);
        let (a, b) = asymmetric_split(spread, skew);
        let mut range_a = a * (1.0 + p.execution_cost);
        let mut range_b = b * (1.0 + p.execution_cost);

        if p.inventory_constraint_active {
            range_a = self.distance_to_limit_scale(range_a, n0);
            range_b = self.distance_to_limit_scale(range_b, n1);

            let limit = 1.0 - p.max_position_size;
            if n0 >= limit {
                range_a *= 0.5;
                debug!(range_a, "At token0 inventory limit, reducing range A");
            }
            if n1 >= limit {
                range_b *= 0.5;
                debug!(range_b, "At token1 inventory limit, reducing range B");
            }
        }

        (range_a, range_b, spread)
    }
}

impl InventoryModel for GlftModel {
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
        let (n0, n1) = prepared.snapshot.normalized();
        let (raw_a, raw_b, spread) = self.widths(n0, n1, prepared.volatility);
        let (range_a, range_b) = self.settings.clamp_ranges(NAME, raw_a, raw_b);

        debug!(n0, n1, spread, range_a, range_b, "GLFT ranges calculated");

        let p = &self.settings.params;
        Ok(RangeRecommendation {
            model_name: NAME.to_string(),
            range_a_percentage: range_a,
            range_b_percentage: range_b,
            inventory_ratio: prepared.snapshot.ratio,
            target_ratio: prepared.target,
            deviation: prepared.deviation,
            volatility: prepared.volatility,
            fallback_used: false,
            diagnostics: ModelDiagnostics::Glft {
                risk_aversion: p.risk_aversion,
                execution_cost: p.execution_cost,
                inventory_penalty: p.inventory_penalty,
                terminal_inventory_penalty: p.terminal_inventory_penalty,
                max_position_size: p.max_position_size,
                inventory_constraint_active: p.inventory_constraint_active,
                normalized_inventory_0: n0,
                normalized_inventory_1: n1,
                spread,
            },
        })
    }

    fn model_info(&self) -> ModelInfo {
        let p = &self.settings.params;
        let vol = &self.settings.volatility;
        ModelInfo {
            name: "Gueant-Lehalle-Fernandez-Tapia Model".to_string(),
            description: "Market making model with inventory constraints and execution costs"
                .to_string(),
            version: "1.0.0".to_string(),
            parameters: json!({
                "risk_aversion": p.risk_aversion,
                "target_inventory_ratio": p.target_inventory_ratio,
                "max_inventory_deviation": p.max_inventory_deviation,
                "base_spread": p.base_spread,
                "execution_cost": p.execution_cost,
                "inventory_penalty": p.inventory_penalty,
                "max_position_size": p.max_position_size,
                "terminal_inventory_penalty": p.terminal_inventory_penalty,
                "inventory_constraint_active": p.inventory_constraint_active,
                "volatility_window_size": vol.window_size,
                "default_volatility": vol.default_volatility,
                "max_volatility": vol.max_volatility,
                "min_volatility": vol.min_volatility,
            }),
            features: vec![
                "Finite inventory constraints".to_string(),
                "Execution cost consideration".to_string(),
                "Inventory holding penalties".to_string(),
                "Terminal inventory optimization".to_string(),
            ],
        }
    }
}
