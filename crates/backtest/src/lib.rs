//! Backtesting engine for the asymmetric LP strategy.
//!
//! This crate provides:
//! - Bar-by-bar replay through the AMM simulator
//! - Edge-triggered rebalancing via the strategy crate
//! - Position, trade and rebalance logs
//! - Returns and drawdown metrics, and multi-model comparison

pub mod compare;
pub mod engine;
pub mod metrics;
pub mod position;
pub mod results;

pub use compare::{compare_models, compare_models_with, ModelComparison};
pub use engine::BacktestEngine;
pub use metrics::{MetricsCalculator, PerformanceMetrics, ValuePoint};
pub use position::{BacktestPosition, PositionTracker};
pub use results::{BacktestResult, RebalanceRecord, TimelineEntry, TradeRecord};
