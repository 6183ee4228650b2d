//! AMM simulator.
//!
//! Wraps a [`Pool`] and turns close-to-close bar moves into swap events.
//! Owns the tick alignment used for every mint.

use crate::band::BandSide;
use crate::pool::{Pool, PoolSwap};
use crate::tick::{price_to_tick, tick_to_price, MAX_TICK};
use asymlp_core::{Error, OhlcBar, PoolConfig, Result, SwapEvent, TradeType};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Result of [`AmmSimulator::mint_position`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MintOutcome {
    /// Liquidity of the token0 band, if minted.
    pub liquidity_upper: Option<f64>,
    /// Liquidity of the token1 band, if minted.
    pub liquidity_lower: Option<f64>,
    /// Sum of both bands' liquidity.
    pub total_liquidity: f64,
    /// Token0 placed into the pool.
    pub token0_deployed: f64,
    /// Token1 placed into the pool.
    pub token1_deployed: f64,
}

/// One tick-aligned band produced by [`AmmSimulator::mint_bands_percent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintedBand {
    pub side: BandSide,
    pub tick_lower: i32,
    pub tick_upper: i32,
    /// Lower price bound of the band as minted.
    pub price_lower: f64,
    /// Upper price bound of the band as minted.
    pub price_upper: f64,
    pub liquidity: f64,
    /// Deposit (token0 for the upper band, token1 for the lower band).
    pub amount: f64,
}

/// Result of [`AmmSimulator::mint_bands_percent`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BandMint {
    pub upper: Option<MintedBand>,
    pub lower: Option<MintedBand>,
    pub total_liquidity: f64,
}

impl BandMint {
    /// Bands that were actually minted, upper first.
    pub fn bands(&self) -> impl Iterator<Item = &MintedBand> {
        self.upper.iter().chain(self.lower.iter())
    }
}

/// Bar-driven AMM simulator.
#[derive(Debug, Clone)]
pub struct AmmSimulator {
    pool: Pool,
    trade_detection_threshold: f64,
    /// Reference price for move detection.
    last_price: Option<f64>,
    /// Per-band records of the most recent swap.
    last_swap: Option<PoolSwap>,
}

impl AmmSimulator {
    /// Create a simulator with an empty pool.
    pub fn new(config: &PoolConfig) -> Self {
        Self {
            pool: Pool::new(config.fee_rate()),
            trade_detection_threshold: config.trade_detection_threshold,
            last_price: None,
            last_swap: None,
        }
    }

    /// Process one bar; emits a swap event when the close moved far enough.
    ///
    /// Without a reference price or without active bands the close is only
    /// remembered. A sub-threshold move leaves the reference price untouched,
    /// so slow drifts accumulate until they cross the threshold.
    pub fn compute(&mut self, bar: &OhlcBar) -> Option<SwapEvent> {
        let close = bar.close;
        if !(close.is_finite() && close > 0.0) {
            warn!(ts_ms = bar.ts_ms, close, "Ignoring bar with invalid close");
            return None;
        }

        let last = match self.last_price {
            Some(last) if last > 0.0 && self.pool.has_bands() => last,
            _ => {
                self.last_price = Some(close);
                return None;
            }
        };

        let price_change = (close - last).abs() / last;
        if price_change == 0.0 || price_change < self.trade_detection_threshold {
            return None;
        }

        let swap = self.pool.swap(close);
        let event = self.build_event(bar.ts_ms, close, last, price_change, &swap);
        self.last_price = Some(close);
        self.last_swap = Some(swap);

        debug!(
            ts_ms = event.ts_ms,
            price = close,
            trade_type = ?event.trade_type,
            volume = event.volume,
            fees_token0 = event.fees_token0,
            fees_token1 = event.fees_token1,
            "Swap detected"
        );

        Some(event)
    }

    fn build_event(
        &self,
        ts_ms: i64,
        close: f64,
        last: f64,
        price_change: f64,
        swap: &PoolSwap,
    ) -> SwapEvent {
        let trade_type = if close > last {
            TradeType::Buy
        } else {
            TradeType::Sell
        };

        let mut event = SwapEvent {
            ts_ms,
            price: close,
            trade_type,
            volume: 0.0,
            price_change,
            sold_token0: 0.0,
            bought_token0: 0.0,
            sold_token1: 0.0,
            bought_token1: 0.0,
            fees_token0: 0.0,
            fees_token1: 0.0,
            new_token0_balance: 0.0,
            new_token1_balance: 0.0,
        };

        for record in swap.records() {
            event.sold_token0 += record.sold_token0;
            event.bought_token0 += record.bought_token0;
            event.sold_token1 += record.sold_token1;
            event.bought_token1 += record.bought_token1;
            event.fees_token0 += record.fees_token0;
            event.fees_token1 += record.fees_token1;
            event.new_token0_balance += record.balance_token0;
            event.new_token1_balance += record.balance_token1;
        }

        event.volume = match trade_type {
            TradeType::Buy => event.sold_token0,
            TradeType::Sell => event.sold_token1 / close,
        };

        event
    }

    /// Replace both bands: token0 over `[current_price, price_upper]` and
    /// token1 over `[price_lower, current_price]`. Zero amounts mint nothing.
    pub fn mint_position(
        &mut self,
        token0_amount: f64,
        token1_amount: f64,
        price_lower: f64,
        price_upper: f64,
        current_price: f64,
    ) -> Result<MintOutcome> {
        if !(current_price.is_finite() && current_price > 0.0) {
            return Err(Error::invalid_input(format!(
                "cannot mint at price {current_price}"
            )));
        }

        self.clear_all_positions();
        let mut outcome = MintOutcome::default();

        if token0_amount > 0.0 {
            let liquidity = self
                .pool
                .mint_upper(token0_amount, current_price, price_upper)?;
            outcome.liquidity_upper = Some(liquidity);
            outcome.token0_deployed = token0_amount;
        }
        if token1_amount > 0.0 {
            let liquidity = self
                .pool
                .mint_lower(token1_amount, current_price, price_lower)?;
            outcome.liquidity_lower = Some(liquidity);
            outcome.token1_deployed = token1_amount;
        }
        outcome.total_liquidity = self.pool.total_liquidity();

        debug!(
            current_price,
            price_lower,
            price_upper,
            token0_amount,
            token1_amount,
            liquidity = outcome.total_liquidity,
            "Minted position"
        );

        Ok(outcome)
    }

    /// Mint both bands from fractional widths around `current_price`.
    ///
    /// Upper band ticks: `[tick(p), tick(p·(1+a))]`, lower band ticks:
    /// `[tick(p·(1−b)), tick(p)]`. Outer ticks are pushed out until their
    /// price lies strictly beyond `p`, so no band is zero-width.
    pub fn mint_bands_percent(
        &mut self,
        current_price: f64,
        range_a_pct: f64,
        range_b_pct: f64,
        token0_amount: f64,
        token1_amount: f64,
    ) -> Result<BandMint> {
        if !(current_price.is_finite() && current_price > 0.0) {
            return Err(Error::invalid_input(format!(
                "cannot mint at price {current_price}"
            )));
        }
        if !(range_a_pct.is_finite() && range_a_pct >= 0.0) {
            return Err(Error::degenerate_band(format!(
                "upper width must be finite and non-negative, got {range_a_pct}"
            )));
        }
        if !(range_b_pct.is_finite() && (0.0..1.0).contains(&range_b_pct)) {
            return Err(Error::degenerate_band(format!(
                "lower width must be within [0, 1), got {range_b_pct}"
            )));
        }

        let spot_tick = price_to_tick(current_price);

        let upper_tick_lower = spot_tick;
        let mut upper_tick_upper = price_to_tick(current_price * (1.0 + range_a_pct));
        if upper_tick_upper <= upper_tick_lower {
            upper_tick_upper = upper_tick_lower + 1;
        }
        // Inner bounds are the spot price, not the spot tick's price.
        while upper_tick_upper < MAX_TICK && tick_to_price(upper_tick_upper) <= current_price {
            upper_tick_upper += 1;
        }

        let lower_tick_upper = spot_tick;
        let mut lower_tick_lower = price_to_tick(current_price * (1.0 - range_b_pct));
        if lower_tick_lower >= lower_tick_upper {
            lower_tick_lower = lower_tick_upper - 1;
        }
        while lower_tick_lower > -MAX_TICK && tick_to_price(lower_tick_lower) >= current_price {
            lower_tick_lower -= 1;
        }

        let price_upper = tick_to_price(upper_tick_upper);
        let price_lower = tick_to_price(lower_tick_lower);

        let outcome = self.mint_position(
            token0_amount,
            token1_amount,
            price_lower,
            price_upper,
            current_price,
        )?;

        let upper = outcome.liquidity_upper.map(|liquidity| MintedBand {
            side: BandSide::Upper,
            tick_lower: upper_tick_lower,
            tick_upper: upper_tick_upper,
            price_lower: current_price,
            price_upper,
            liquidity,
            amount: token0_amount,
        });
        let lower = outcome.liquidity_lower.map(|liquidity| MintedBand {
            side: BandSide::Lower,
            tick_lower: lower_tick_lower,
            tick_upper: lower_tick_upper,
            price_lower,
            price_upper: current_price,
            liquidity,
            amount: token1_amount,
        });

        Ok(BandMint {
            upper,
            lower,
            total_liquidity: outcome.total_liquidity,
        })
    }

    pub fn has_active_positions(&self) -> bool {
        self.pool.has_bands()
    }

    /// Summed `(token0, token1)` held by the active bands.
    pub fn active_positions_balances(&self) -> (f64, f64) {
        self.pool.balances()
    }

    pub fn clear_all_positions(&mut self) {
        self.pool.clear();
        self.last_swap = None;
    }

    /// Per-band records behind the most recent swap event, until the next mint or clear.
    pub fn last_swap(&self) -> Option<&PoolSwap> {
        self.last_swap.as_ref()
    }

    /// Reference price used for move detection.
    pub fn last_price(&self) -> Option<f64> {
        self.last_price
    }

    pub fn fee_rate(&self) -> f64 {
        self.pool.fee_rate()
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}
