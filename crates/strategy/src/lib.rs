//! Rebalance strategy for asymmetric concentrated-liquidity positions.
//!
//! This crate provides:
//! - The edge-triggered per-token depletion check
//! - Rebalance planning through an inventory model
//! - Post-startup token split targeting

pub mod allocation;
pub mod rebalance;

pub use rebalance::{AsymmetricLpStrategy, PlanRequest, RebalanceBaseline, RebalancePlan};
