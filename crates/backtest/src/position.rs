//! Position tracking for backtesting.
//!
//! Reporting mirror of the bands currently minted in the AMM simulator.
//! Replaced wholesale on every rebalance.

use asymlp_amm::{BandMint, BandSide, PoolSwap};
use asymlp_core::{ts_to_datetime, TimestampMs};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A minted band as seen by the backtest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestPosition {
    /// Sequential id, unique within a run.
    pub token_id: u64,
    pub side: BandSide,
    /// Token0 deposited at mint.
    pub token0_amount: f64,
    /// Token1 deposited at mint.
    pub token1_amount: f64,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub price_lower: f64,
    pub price_upper: f64,
    pub liquidity: f64,
    /// Token0 fees earned by this band since mint.
    pub fees_collected_0: f64,
    /// Token1 fees earned by this band since mint.
    pub fees_collected_1: f64,
    pub created_at: DateTime<Utc>,
}

/// Position tracker for backtesting.
#[derive(Debug, Clone, Default)]
pub struct PositionTracker {
    positions: Vec<BacktestPosition>,
    next_token_id: u64,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every position, returning how many were burned.
    pub fn burn_all(&mut self) -> usize {
        let burned = self.positions.len();
        self.positions.clear();
        burned
    }

    /// Record the bands of a mint. Only bands that were actually minted appear.
    pub fn open_from_mint(&mut self, mint: &BandMint, ts_ms: TimestampMs) -> usize {
        let created_at = ts_to_datetime(ts_ms);
        for band in mint.bands() {
            self.next_token_id += 1;
            let (token0_amount, token1_amount) = match band.side {
                BandSide::Upper => (band.amount, 0.0),
                BandSide::Lower => (0.0, band.amount),
            };
            self.positions.push(BacktestPosition {
                token_id: self.next_token_id,
                side: band.side,
                token0_amount,
                token1_amount,
                tick_lower: band.tick_lower,
                tick_upper: band.tick_upper,
                price_lower: band.price_lower,
                price_upper: band.price_upper,
                liquidity: band.liquidity,
                fees_collected_0: 0.0,
                fees_collected_1: 0.0,
                created_at,
            });
        }
        self.positions.len()
    }

    /// Credit each position with the fees its band earned in a swap.
    pub fn record_fees(&mut self, swap: &PoolSwap) {
        for position in &mut self.positions {
            let record = match position.side {
                BandSide::Upper => swap.upper.as_ref(),
                BandSide::Lower => swap.lower.as_ref(),
            };
            if let Some(record) = record {
                position.fees_collected_0 += record.fees_token0;
                position.fees_collected_1 += record.fees_token1;
            }
        }
    }

    pub fn positions(&self) -> &[BacktestPosition] {
        &self.positions
    }

    pub fn has_positions(&self) -> bool {
        !self.positions.is_empty()
    }

    /// Total `(token0, token1)` fees across open positions.
    pub fn fees_collected(&self) -> (f64, f64) {
        self.positions.iter().fold((0.0, 0.0), |(f0, f1), p| {
            (f0 + p.fees_collected_0, f1 + p.fees_collected_1)
        })
    }
}
