//! Configuration structures for the asymmetric LP system.
//!
//! A single [`Config`] is built once (defaults, or JSON with defaults filled in),
//! validated, and passed by reference into every component constructor.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Main configuration for the LP system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pool / AMM simulation configuration.
    pub pool: PoolConfig,
    /// Range width bounds.
    pub ranges: RangeConfig,
    /// Rebalance strategy configuration.
    pub strategy: StrategyConfig,
    /// Inventory model parameters.
    pub model: ModelConfig,
    /// Volatility estimation configuration.
    pub volatility: VolatilityConfig,
    /// Backtest configuration.
    pub backtest: BacktestConfig,
}

impl Config {
    /// Parse a JSON document (missing fields take defaults) and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every cross-field and range constraint.
    pub fn validate(&self) -> Result<()> {
        self.pool.validate()?;
        self.ranges.validate()?;
        self.strategy.validate()?;
        self.model.validate()?;
        self.volatility.validate()?;
        self.backtest.validate()
    }
}

fn require_fraction(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::config(format!(
            "{name} must be a finite non-negative number, got {value}"
        )));
    }
    Ok(())
}

/// Pool and swap detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Pool fee tier in basis points (30 = 0.3%).
    pub fee_tier_bps: u32,
    /// Minimum fractional close-to-close move treated as a swap.
    pub trade_detection_threshold: f64,
}

impl PoolConfig {
    /// Fee as a fraction of the sold amount.
    #[inline]
    pub fn fee_rate(&self) -> f64 {
        self.fee_tier_bps as f64 / 10_000.0
    }

    fn validate(&self) -> Result<()> {
        if self.fee_tier_bps >= 10_000 {
            return Err(Error::config(format!(
                "fee_tier_bps must be below 10000, got {}",
                self.fee_tier_bps
            )));
        }
        require_fraction("trade_detection_threshold", self.trade_detection_threshold)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            fee_tier_bps: 30,
            trade_detection_threshold: 0.0005,
        }
    }
}

/// Bounds applied to every model's range widths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeConfig {
    /// Smallest allowed range width (fraction of spot).
    pub min_range_percentage: f64,
    /// Largest allowed range width (fraction of spot, below 1).
    pub max_range_percentage: f64,
}

impl RangeConfig {
    /// Clamp a width into `[min, max]`. Non-finite widths collapse to `min`.
    #[inline]
    pub fn clamp(&self, width: f64) -> f64 {
        if !width.is_finite() {
            return self.min_range_percentage;
        }
        width.clamp(self.min_range_percentage, self.max_range_percentage)
    }

    fn validate(&self) -> Result<()> {
        let (min, max) = (self.min_range_percentage, self.max_range_percentage);
        if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max && max < 1.0) {
            return Err(Error::config(format!(
                "range bounds must satisfy 0 < min <= max < 1, got min={min} max={max}"
            )));
        }
        Ok(())
    }
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            min_range_percentage: 0.02,
            max_range_percentage: 0.50,
        }
    }
}

/// How token balances are re-split before a non-initial mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMode {
    /// Deploy balances as they are.
    #[default]
    Disabled,
    /// Move each token back toward its unit count at backtest start.
    InitialUnits,
    /// Move the value split back toward the initial target ratio.
    ValueRatio,
}

/// Rebalance strategy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Per-token depletion fraction (since the last rebalance) that triggers a rebalance.
    pub rebalance_threshold: f64,
    /// Inventory model registry name.
    pub inventory_model: String,
    /// Token split targeting after the startup mint.
    pub allocation: AllocationMode,
    /// Token0 address, handed to the decimals lookup.
    pub token0_address: String,
    /// Token1 address, handed to the decimals lookup.
    pub token1_address: String,
}

impl StrategyConfig {
    fn validate(&self) -> Result<()> {
        require_fraction("rebalance_threshold", self.rebalance_threshold)?;
        if self.inventory_model.trim().is_empty() {
            return Err(Error::config("inventory_model must not be empty"));
        }
        Ok(())
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            rebalance_threshold: 0.10,
            inventory_model: "AvellanedaStoikovModel".to_string(),
            allocation: AllocationMode::Disabled,
            token0_address: "0x0000000000000000000000000000000000000000".to_string(),
            token1_address: "0x0000000000000000000000000000000000000001".to_string(),
        }
    }
}

/// Inventory model parameters (shared across models; each reads what it needs).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Risk aversion (gamma).
    pub risk_aversion: f64,
    /// Target token0 share of portfolio value.
    pub target_inventory_ratio: f64,
    /// Maximum tolerated deviation from target (informational).
    pub max_inventory_deviation: f64,
    /// Base spread for AS and GLFT.
    pub base_spread: f64,
    /// GLFT execution cost.
    pub execution_cost: f64,
    /// GLFT linear inventory holding penalty.
    pub inventory_penalty: f64,
    /// GLFT quadratic terminal inventory penalty.
    pub terminal_inventory_penalty: f64,
    /// GLFT finite-inventory limit (fraction of portfolio).
    pub max_position_size: f64,
    /// Enables the GLFT finite-inventory constraints.
    pub inventory_constraint_active: bool,
    /// Simple model base range width.
    pub simple_base_range: f64,
    /// Simple model sensitivity to inventory deviation.
    pub simple_inventory_sensitivity: f64,
}

impl ModelConfig {
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("risk_aversion", self.risk_aversion),
            ("max_inventory_deviation", self.max_inventory_deviation),
            ("base_spread", self.base_spread),
            ("execution_cost", self.execution_cost),
            ("inventory_penalty", self.inventory_penalty),
            ("terminal_inventory_penalty", self.terminal_inventory_penalty),
            ("simple_base_range", self.simple_base_range),
            ("simple_inventory_sensitivity", self.simple_inventory_sensitivity),
        ] {
            require_fraction(name, value)?;
        }
        if !(0.0..=1.0).contains(&self.target_inventory_ratio) {
            return Err(Error::config(format!(
                "target_inventory_ratio must be within [0, 1], got {}",
                self.target_inventory_ratio
            )));
        }
        if !(self.max_position_size > 0.0 && self.max_position_size <= 1.0) {
            return Err(Error::config(format!(
                "max_position_size must be within (0, 1], got {}",
                self.max_position_size
            )));
        }
        Ok(())
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            risk_aversion: 0.1,
            target_inventory_ratio: 0.5,
            max_inventory_deviation: 0.3,
            base_spread: 0.05,
            execution_cost: 0.001,
            inventory_penalty: 0.05,
            terminal_inventory_penalty: 0.2,
            max_position_size: 0.1,
            inventory_constraint_active: false,
            simple_base_range: 0.05,
            simple_inventory_sensitivity: 2.0,
        }
    }
}

/// Realized volatility estimation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilityConfig {
    /// Number of most recent price points used.
    pub window_size: usize,
    /// Volatility reported when fewer than two returns are available.
    pub default_volatility: f64,
    /// Lower clamp on annualized volatility.
    pub min_volatility: f64,
    /// Upper clamp on annualized volatility.
    pub max_volatility: f64,
    /// Annualization factor for 1-minute returns.
    pub minutes_per_year: f64,
}

impl VolatilityConfig {
    fn validate(&self) -> Result<()> {
        if self.window_size < 2 {
            return Err(Error::config("volatility window_size must be at least 2"));
        }
        require_fraction("min_volatility", self.min_volatility)?;
        require_fraction("max_volatility", self.max_volatility)?;
        require_fraction("default_volatility", self.default_volatility)?;
        if self.min_volatility > self.max_volatility {
            return Err(Error::config(format!(
                "min_volatility ({}) exceeds max_volatility ({})",
                self.min_volatility, self.max_volatility
            )));
        }
        if !(self.minutes_per_year.is_finite() && self.minutes_per_year > 0.0) {
            return Err(Error::config("minutes_per_year must be positive"));
        }
        Ok(())
    }
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            window_size: 20,
            default_volatility: 0.02,
            min_volatility: 0.01,
            max_volatility: 2.0,
            minutes_per_year: 525_600.0,
        }
    }
}

/// Backtest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Capacity of the price history ring buffer handed to the models.
    pub price_history_size: usize,
    /// Decimals reported by the backtest's fixed decimals lookup.
    pub token_decimals: u8,
}

impl BacktestConfig {
    fn validate(&self) -> Result<()> {
        if self.price_history_size == 0 {
            return Err(Error::config("price_history_size must be positive"));
        }
        if self.token_decimals > 36 {
            return Err(Error::config(format!(
                "token_decimals must be at most 36, got {}",
                self.token_decimals
            )));
        }
        Ok(())
    }
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            price_history_size: 20,
            token_decimals: 18,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.pool.fee_tier_bps, 30);
        assert_eq!(config.strategy.rebalance_threshold, 0.10);
        assert_eq!(config.ranges.min_range_percentage, 0.02);
        assert_eq!(config.volatility.window_size, 20);
        assert!(!config.model.inventory_constraint_active);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fee_rate() {
        let pool = PoolConfig {
            fee_tier_bps: 5,
            ..Default::default()
        };
        assert!((pool.fee_rate() - 0.0005).abs() < 1e-12);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{
            "pool": { "fee_tier_bps": 5 },
            "strategy": { "inventory_model": "GLFTModel", "allocation": "value_ratio" }
        }"#;
        let config = Config::from_json_str(json).unwrap();
        assert_eq!(config.pool.fee_tier_bps, 5);
        assert_eq!(config.pool.trade_detection_threshold, 0.0005);
        assert_eq!(config.strategy.inventory_model, "GLFTModel");
        assert_eq!(config.strategy.allocation, AllocationMode::ValueRatio);
        assert_eq!(config.model.risk_aversion, 0.1);
    }

    #[test]
    fn test_invalid_range_bounds_rejected() {
        let mut config = Config::default();
        config.ranges.max_range_percentage = 1.0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.ranges.max_range_percentage = 0.01;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_volatility_bounds_rejected() {
        let mut config = Config::default();
        config.volatility.min_volatility = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_range_clamp() {
        let ranges = RangeConfig::default();
        assert_eq!(ranges.clamp(0.001), 0.02);
        assert_eq!(ranges.clamp(0.9), 0.50);
        assert_eq!(ranges.clamp(0.1), 0.1);
        assert_eq!(ranges.clamp(f64::NAN), 0.02);
        assert_eq!(ranges.clamp(f64::INFINITY), 0.02);
    }
}
