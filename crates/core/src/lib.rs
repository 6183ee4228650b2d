//! Core types and configuration for the asymmetric LP system.
//!
//! This crate provides shared types used across all other crates:
//! - Bar series and swap event types
//! - Configuration structures
//! - Common error types
//! - The token decimals lookup interface

pub mod config;
pub mod decimals;
pub mod error;
pub mod types;

pub use config::{
    AllocationMode, BacktestConfig, Config, ModelConfig, PoolConfig, RangeConfig, StrategyConfig,
    VolatilityConfig,
};
pub use decimals::{FixedDecimals, TokenDecimals};
pub use error::{Error, Result};
pub use types::*;
