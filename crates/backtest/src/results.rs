//! Trade and rebalance logs and the backtest result document.

use crate::metrics::{PerformanceMetrics, ValuePoint};
use crate::position::BacktestPosition;
use asymlp_amm::BandMint;
use asymlp_core::{ts_to_datetime, Result, SwapEvent, TimestampMs, TradeType};
use asymlp_models::RangeRecommendation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One swap against the strategy's bands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub ts_ms: TimestampMs,
    pub timestamp: DateTime<Utc>,
    pub trade_type: TradeType,
    pub price: f64,
    /// Fractional move that triggered the swap.
    pub price_change: f64,
    /// Volume in token0 units.
    pub volume: f64,
    pub sold_token0: f64,
    pub bought_token0: f64,
    pub sold_token1: f64,
    pub bought_token1: f64,
    pub fees_token0: f64,
    pub fees_token1: f64,
    /// Fees in token1 units at the swap price.
    pub fees_earned: f64,
    pub token0_balance_after: f64,
    pub token1_balance_after: f64,
    /// Upper band width active during the swap.
    pub range_a_pct: f64,
    /// Lower band width active during the swap.
    pub range_b_pct: f64,
}

impl TradeRecord {
    pub fn from_event(event: &SwapEvent, active_widths: (f64, f64)) -> Self {
        Self {
            ts_ms: event.ts_ms,
            timestamp: ts_to_datetime(event.ts_ms),
            trade_type: event.trade_type,
            price: event.price,
            price_change: event.price_change,
            volume: event.volume,
            sold_token0: event.sold_token0,
            bought_token0: event.bought_token0,
            sold_token1: event.sold_token1,
            bought_token1: event.bought_token1,
            fees_token0: event.fees_token0,
            fees_token1: event.fees_token1,
            fees_earned: event.fees_in_token1(),
            token0_balance_after: event.new_token0_balance,
            token1_balance_after: event.new_token1_balance,
            range_a_pct: active_widths.0,
            range_b_pct: active_widths.1,
        }
    }
}

/// One burn-and-mint cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalanceRecord {
    pub ts_ms: TimestampMs,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub positions_burned: usize,
    pub new_positions: usize,
    pub is_initial_mint: bool,
    pub range_a_pct: f64,
    pub range_b_pct: f64,
    pub token0_deployed: f64,
    pub token1_deployed: f64,
    /// Upper bound of the token0 band, if minted.
    pub upper_band_price: Option<f64>,
    /// Lower bound of the token1 band, if minted.
    pub lower_band_price: Option<f64>,
    pub recommendation: RangeRecommendation,
    /// Token-unit targets used by the allocation step, if any.
    pub target_units: Option<(f64, f64)>,
}

impl RebalanceRecord {
    pub(crate) fn band_prices(mint: Option<&BandMint>) -> (Option<f64>, Option<f64>) {
        match mint {
            Some(mint) => (
                mint.upper.as_ref().map(|b| b.price_upper),
                mint.lower.as_ref().map(|b| b.price_lower),
            ),
            None => (None, None),
        }
    }
}

/// Trades and rebalances merged in time order.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimelineEntry<'a> {
    Trade(&'a TradeRecord),
    Rebalance(&'a RebalanceRecord),
}

impl TimelineEntry<'_> {
    pub fn ts_ms(&self) -> TimestampMs {
        match self {
            TimelineEntry::Trade(t) => t.ts_ms,
            TimelineEntry::Rebalance(r) => r.ts_ms,
        }
    }

    /// Within a bar the swap happens before the rebalance it triggers.
    fn order_in_bar(&self) -> u8 {
        match self {
            TimelineEntry::Trade(_) => 0,
            TimelineEntry::Rebalance(_) => 1,
        }
    }
}

/// Result of a backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub model_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub initial_balance_0: f64,
    pub initial_balance_1: f64,
    pub final_balance_0: f64,
    pub final_balance_1: f64,
    /// Token0 value share at the first close; the model's target for the run.
    pub initial_target_ratio: f64,
    pub total_rebalances: usize,
    pub total_trades: usize,
    pub trades: Vec<TradeRecord>,
    pub rebalances: Vec<RebalanceRecord>,
    pub metrics: PerformanceMetrics,
    pub final_positions: Vec<BacktestPosition>,
    /// Portfolio value after each bar.
    pub portfolio_values: Vec<ValuePoint>,
}

impl BacktestResult {
    /// Trades and rebalances interleaved by timestamp.
    pub fn timeline(&self) -> Vec<TimelineEntry<'_>> {
        let mut entries: Vec<TimelineEntry<'_>> = self
            .trades
            .iter()
            .map(TimelineEntry::Trade)
            .chain(self.rebalances.iter().map(TimelineEntry::Rebalance))
            .collect();
        entries.sort_by_key(|e| (e.ts_ms(), e.order_in_bar()));
        entries
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        #[derive(Serialize)]
        struct Document<'a> {
            #[serde(flatten)]
            result: &'a BacktestResult,
            timeline: Vec<TimelineEntry<'a>>,
        }

        let document = Document {
            result: self,
            timeline: self.timeline(),
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}
