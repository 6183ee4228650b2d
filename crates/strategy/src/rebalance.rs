//! Rebalance trigger and planning.
//!
//! Shared by backtest and live drivers. Holds configuration and collaborators
//! only; all run state is passed in.

use crate::allocation::{toward_initial_units, toward_value_ratio};
use asymlp_core::decimals::{pair_decimals, to_raw};
use asymlp_core::{AllocationMode, PricePoint, Result, StrategyConfig, TokenDecimals};
use asymlp_models::{InventoryModel, RangeInputs, RangeRecommendation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Balances and price captured right after a successful mint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RebalanceBaseline {
    pub token0: f64,
    pub token1: f64,
    pub price: f64,
}

/// Everything `plan_rebalance` needs about the current state.
#[derive(Debug, Clone, Copy)]
pub struct PlanRequest<'a> {
    pub current_price: f64,
    pub price_history: &'a [PricePoint],
    /// Token0 available to deploy (human units).
    pub token0_balance: f64,
    /// Token1 available to deploy (human units).
    pub token1_balance: f64,
    /// Token0 value share at backtest start.
    pub initial_target_ratio: f64,
    /// `(token0, token1)` units at backtest start.
    pub initial_units: Option<(f64, f64)>,
    /// True for the very first mint; the split is never adjusted then.
    pub startup_allocation: bool,
}

/// Planned mint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalancePlan {
    /// Upper band width (fraction of spot).
    pub range_a_pct: f64,
    /// Lower band width (fraction of spot).
    pub range_b_pct: f64,
    pub token0_amount: f64,
    pub token1_amount: f64,
    /// Model output the widths came from.
    pub recommendation: RangeRecommendation,
}

/// Asymmetric LP strategy: when to rebalance and what to mint.
pub struct AsymmetricLpStrategy {
    config: StrategyConfig,
    model: Box<dyn InventoryModel>,
    decimals: Arc<dyn TokenDecimals>,
}

impl AsymmetricLpStrategy {
    pub fn new(
        config: StrategyConfig,
        model: Box<dyn InventoryModel>,
        decimals: Arc<dyn TokenDecimals>,
    ) -> Self {
        info!(
            model = model.name(),
            rebalance_threshold = config.rebalance_threshold,
            allocation = ?config.allocation,
            "Strategy initialized"
        );
        Self {
            config,
            model,
            decimals,
        }
    }

    /// Depletion check against the last rebalance baseline.
    ///
    /// Without positions (or without a baseline) a mint is always due.
    pub fn should_rebalance(
        &self,
        current_price: f64,
        current: (f64, f64),
        baseline: Option<&RebalanceBaseline>,
        has_positions: bool,
    ) -> bool {
        let baseline = match baseline {
            Some(b) if has_positions => b,
            _ => return true,
        };
        if !(current_price.is_finite() && current_price > 0.0) {
            return false;
        }

        let dev0 = depletion(baseline.token0, current.0);
        let dev1 = depletion(baseline.token1, current.1);
        let due = dev0 > self.config.rebalance_threshold || dev1 > self.config.rebalance_threshold;
        if due {
            debug!(dev0, dev1, threshold = self.config.rebalance_threshold, "Rebalance due");
        }
        due
    }

    /// Ask the model for widths and decide the amounts to deploy.
    pub fn plan_rebalance(&self, request: &PlanRequest<'_>) -> Result<RebalancePlan> {
        let (d0, d1) = pair_decimals(
            self.decimals.as_ref(),
            &self.config.token0_address,
            &self.config.token1_address,
        )?;

        let inputs = RangeInputs {
            token0_balance: to_raw(request.token0_balance.max(0.0), d0),
            token1_balance: to_raw(request.token1_balance.max(0.0), d1),
            spot_price: request.current_price,
            price_history: request.price_history,
            token0_address: &self.config.token0_address,
            token1_address: &self.config.token1_address,
        };
        let recommendation = self.model.calculate_lp_ranges(&inputs, self.decimals.as_ref());

        let (mut token0, mut token1) = (request.token0_balance, request.token1_balance);
        if !request.startup_allocation && request.current_price > 0.0 {
            (token0, token1) = match (self.config.allocation, request.initial_units) {
                (AllocationMode::Disabled, _) => (token0, token1),
                (AllocationMode::InitialUnits, Some((u0, u1))) => {
                    toward_initial_units(token0, token1, request.current_price, u0, u1)
                }
                (AllocationMode::InitialUnits, None) => {
                    debug!("No initial units supplied, deploying balances as-is");
                    (token0, token1)
                }
                (AllocationMode::ValueRatio, _) => toward_value_ratio(
                    token0,
                    token1,
                    request.current_price,
                    request.initial_target_ratio,
                ),
            };
        }

        let plan = RebalancePlan {
            range_a_pct: recommendation.range_a_percentage,
            range_b_pct: recommendation.range_b_percentage,
            token0_amount: token0.max(0.0),
            token1_amount: token1.max(0.0),
            recommendation,
        };
        debug!(
            range_a = plan.range_a_pct,
            range_b = plan.range_b_pct,
            token0 = plan.token0_amount,
            token1 = plan.token1_amount,
            "Rebalance planned"
        );
        Ok(plan)
    }

    pub fn model(&self) -> &dyn InventoryModel {
        self.model.as_ref()
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }
}

/// Fractional drop from `baseline` to `current`; zero when not depleted.
#[inline]
fn depletion(baseline: f64, current: f64) -> f64 {
    if baseline > 0.0 && current < baseline {
        (baseline - current.max(0.0)) / baseline
    } else {
        0.0
    }
}
