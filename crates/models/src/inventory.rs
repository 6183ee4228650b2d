//! Shared inventory model plumbing: inputs, outputs, validation and the
//! common ratio / volatility preparation every model starts from.

use crate::volatility::annualized_volatility;
use asymlp_core::decimals::{pair_decimals, to_human};
use asymlp_core::{
    Config, Error, ModelConfig, PricePoint, RangeConfig, Result, TokenDecimals, VolatilityConfig,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Inputs to a range calculation.
#[derive(Debug, Clone, Copy)]
pub struct RangeInputs<'a> {
    /// Token0 balance in smallest units.
    pub token0_balance: f64,
    /// Token1 balance in smallest units.
    pub token1_balance: f64,
    /// Spot price (token1 per token0).
    pub spot_price: f64,
    /// Recent prices, oldest first.
    pub price_history: &'a [PricePoint],
    pub token0_address: &'a str,
    pub token1_address: &'a str,
}

/// Model-specific metadata attached to a recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelDiagnostics {
    Simple {
        base_range: f64,
        inventory_sensitivity: f64,
    },
    AvellanedaStoikov {
        risk_aversion: f64,
        base_spread: f64,
        volatility_window: usize,
        skew: f64,
        spread: f64,
    },
    Glft {
        risk_aversion: f64,
        execution_cost: f64,
        inventory_penalty: f64,
        terminal_inventory_penalty: f64,
        max_position_size: f64,
        inventory_constraint_active: bool,
        normalized_inventory_0: f64,
        normalized_inventory_1: f64,
        spread: f64,
    },
    /// Free-form metadata from runtime-registered models.
    Custom { data: serde_json::Value },
    /// The calculation failed and minimum ranges were returned.
    Fallback { error: String },
}

/// Output of an inventory model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeRecommendation {
    /// Registry name of the producing model.
    pub model_name: String,
    /// Upper (token0) band width as a fraction of spot.
    pub range_a_percentage: f64,
    /// Lower (token1) band width as a fraction of spot.
    pub range_b_percentage: f64,
    /// Token0 share of portfolio value.
    pub inventory_ratio: f64,
    pub target_ratio: f64,
    /// `|inventory_ratio - target_ratio|`.
    pub deviation: f64,
    /// Annualized volatility used.
    pub volatility: f64,
    pub fallback_used: bool,
    pub diagnostics: ModelDiagnostics,
}

impl RangeRecommendation {
    /// Error text when the fallback was used.
    pub fn error(&self) -> Option<&str> {
        match &self.diagnostics {
            ModelDiagnostics::Fallback { error } => Some(error),
            _ => None,
        }
    }
}

/// Descriptive information about a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub description: String,
    pub version: String,
    pub parameters: serde_json::Value,
    pub features: Vec<String>,
}

/// Configuration slice every model carries.
#[derive(Debug, Clone, Default)]
pub struct ModelSettings {
    pub params: ModelConfig,
    pub ranges: RangeConfig,
    pub volatility: VolatilityConfig,
}

impl ModelSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            params: config.model.clone(),
            ranges: config.ranges.clone(),
            volatility: config.volatility.clone(),
        }
    }

    /// Clamp both widths into the configured bounds.
    pub fn clamp_ranges(&self, model: &str, range_a: f64, range_b: f64) -> (f64, f64) {
        let a = self.ranges.clamp(range_a);
        let b = self.ranges.clamp(range_b);
        if a != range_a || b != range_b {
            debug!(model, range_a, range_b, clamped_a = a, clamped_b = b, "Range constrained by min/max limits");
        }
        (a, b)
    }

    /// Minimum ranges, neutral ratio, default volatility.
    pub fn fallback(&self, model: &str, error: &Error) -> RangeRecommendation {
        RangeRecommendation {
            model_name: model.to_string(),
            range_a_percentage: self.ranges.min_range_percentage,
            range_b_percentage: self.ranges.min_range_percentage,
            inventory_ratio: 0.5,
            target_ratio: self.params.target_inventory_ratio,
            deviation: 0.0,
            volatility: self.volatility.default_volatility,
            fallback_used: true,
            diagnostics: ModelDiagnostics::Fallback {
                error: error.to_string(),
            },
        }
    }
}

/// Reject negative or non-finite balances, non-positive price, bad history.
pub fn validate_inputs(inputs: &RangeInputs<'_>) -> Result<()> {
    for (name, balance) in [
        ("token0_balance", inputs.token0_balance),
        ("token1_balance", inputs.token1_balance),
    ] {
        if !balance.is_finite() || balance < 0.0 {
            return Err(Error::invalid_input(format!("{name} must be finite and >= 0, got {balance}")));
        }
    }
    if !(inputs.spot_price.is_finite() && inputs.spot_price > 0.0) {
        return Err(Error::invalid_input(format!(
            "spot_price must be finite and > 0, got {}",
            inputs.spot_price
        )));
    }
    if let Some(bad) = inputs
        .price_history
        .iter()
        .find(|p| !(p.price.is_finite() && p.price > 0.0))
    {
        return Err(Error::invalid_input(format!(
            "price history point at {} has invalid price {}",
            bad.ts_ms, bad.price
        )));
    }
    Ok(())
}

/// Human-unit view of the portfolio at spot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InventorySnapshot {
    pub token0_amount: f64,
    pub token1_amount: f64,
    /// Token0 value in token1 units.
    pub value0: f64,
    pub total_value: f64,
    pub ratio: f64,
}

impl InventorySnapshot {
    /// Token0 and token1 value shares (0 when the portfolio is empty).
    pub fn normalized(&self) -> (f64, f64) {
        if self.total_value > 0.0 {
            (
                self.value0 / self.total_value,
                self.token1_amount / self.total_value,
            )
        } else {
            (0.0, 0.0)
        }
    }
}

/// Everything a model needs after validation.
#[derive(Debug, Clone, Copy)]
pub struct Prepared {
    pub snapshot: InventorySnapshot,
    pub target: f64,
    pub deviation: f64,
    pub volatility: f64,
}

/// Validate, scale balances by decimals, and compute ratio and volatility.
pub fn prepare(
    inputs: &RangeInputs<'_>,
    decimals: &dyn TokenDecimals,
    settings: &ModelSettings,
) -> Result<Prepared> {
    validate_inputs(inputs)?;

    let (d0, d1) = pair_decimals(decimals, inputs.token0_address, inputs.token1_address)?;
    let token0_amount = to_human(inputs.token0_balance, d0);
    let token1_amount = to_human(inputs.token1_balance, d1);
    let value0 = token0_amount * inputs.spot_price;
    let total_value = value0 + token1_amount;
    let ratio = asymlp_core::inventory_ratio(token0_amount, token1_amount, inputs.spot_price);

    let target = settings.params.target_inventory_ratio;
    Ok(Prepared {
        snapshot: InventorySnapshot {
            token0_amount,
            token1_amount,
            value0,
            total_value,
            ratio,
        },
        target,
        deviation: (ratio - target).abs(),
        volatility: annualized_volatility(inputs.price_history, &settings.volatility),
    })
}
