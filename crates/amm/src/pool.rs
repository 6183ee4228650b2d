//! Two-band pool: an optional token0 band above spot and an optional token1
//! band below spot.

use crate::band::{BandRecord, RangeBand};
use asymlp_core::{Error, Result};

/// Settled records from one pool swap.
#[derive(Debug, Clone, Default)]
pub struct PoolSwap {
    pub upper: Option<BandRecord>,
    pub lower: Option<BandRecord>,
}

impl PoolSwap {
    /// Iterate over the records of the bands that exist.
    pub fn records(&self) -> impl Iterator<Item = &BandRecord> {
        self.upper.iter().chain(self.lower.iter())
    }
}

/// Container for the upper and lower bands.
#[derive(Debug, Clone)]
pub struct Pool {
    fee_rate: f64,
    upper: Option<RangeBand>,
    lower: Option<RangeBand>,
}

impl Pool {
    /// Create an empty pool.
    pub fn new(fee_rate: f64) -> Self {
        Self {
            fee_rate,
            upper: None,
            lower: None,
        }
    }

    /// Mint the token0 band over `[current_price, price_upper]`, replacing any existing one.
    pub fn mint_upper(&mut self, amount: f64, current_price: f64, price_upper: f64) -> Result<f64> {
        if price_upper <= current_price {
            return Err(Error::degenerate_band(format!(
                "upper band bound {price_upper} must be above spot {current_price}"
            )));
        }
        let band = RangeBand::token0(self.fee_rate, current_price, price_upper, amount)?;
        let liquidity = band.liquidity();
        self.upper = Some(band);
        Ok(liquidity)
    }

    /// Mint the token1 band over `[price_lower, current_price]`, replacing any existing one.
    pub fn mint_lower(&mut self, amount: f64, current_price: f64, price_lower: f64) -> Result<f64> {
        if price_lower >= current_price {
            return Err(Error::degenerate_band(format!(
                "lower band bound {price_lower} must be below spot {current_price}"
            )));
        }
        let band = RangeBand::token1(self.fee_rate, price_lower, current_price, amount)?;
        let liquidity = band.liquidity();
        self.lower = Some(band);
        Ok(liquidity)
    }

    pub fn clear_upper(&mut self) {
        self.upper = None;
    }

    pub fn clear_lower(&mut self) {
        self.lower = None;
    }

    /// Remove both bands.
    pub fn clear(&mut self) {
        self.upper = None;
        self.lower = None;
    }

    /// Move every band to `price` and settle it.
    pub fn swap(&mut self, price: f64) -> PoolSwap {
        let settle = |band: &mut RangeBand| {
            band.swap(price);
            band.settle()
        };
        PoolSwap {
            upper: self.upper.as_mut().map(settle),
            lower: self.lower.as_mut().map(settle),
        }
    }

    /// Summed `(token0, token1)` across both bands.
    pub fn balances(&self) -> (f64, f64) {
        self.bands().fold((0.0, 0.0), |(t0, t1), band| {
            (t0 + band.balance_token0(), t1 + band.balance_token1())
        })
    }

    pub fn has_bands(&self) -> bool {
        self.upper.is_some() || self.lower.is_some()
    }

    pub fn total_liquidity(&self) -> f64 {
        self.bands().map(RangeBand::liquidity).sum()
    }

    pub fn upper(&self) -> Option<&RangeBand> {
        self.upper.as_ref()
    }

    pub fn lower(&self) -> Option<&RangeBand> {
        self.lower.as_ref()
    }

    pub fn fee_rate(&self) -> f64 {
        self.fee_rate
    }

    fn bands(&self) -> impl Iterator<Item = &RangeBand> {
        self.upper.iter().chain(self.lower.iter())
    }
}
