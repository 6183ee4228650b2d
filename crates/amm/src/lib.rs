//! Concentrated-liquidity AMM simulation for asymmetric LP backtests.
//!
//! This crate provides:
//! - Single-sided range bands with constant-liquidity swap math
//! - A two-band pool (token0 above spot, token1 below spot)
//! - Bar-driven swap detection and tick-aligned minting

pub mod band;
pub mod pool;
pub mod simulator;
pub mod tick;

pub use band::{BandRecord, BandSide, RangeBand};
pub use pool::{Pool, PoolSwap};
pub use simulator::{AmmSimulator, BandMint, MintOutcome, MintedBand};
pub use tick::{price_to_tick, tick_to_price};
