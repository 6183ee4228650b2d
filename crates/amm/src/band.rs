//! Single-sided concentrated-liquidity band.
//!
//! A band is minted holding one token over `[range_lower, range_upper]`. Its
//! liquidity is derived once at mint and stays fixed for the band's lifetime;
//! swaps move balances between the two tokens along the constant-L curve.

use asymlp_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Which token a band was minted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BandSide {
    /// Token0 deposit above spot (sold as price rises).
    Upper,
    /// Token1 deposit below spot (sold as price falls).
    Lower,
}

/// Settled state of a band after one swap step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandRecord {
    pub side: BandSide,
    pub range_lower: f64,
    pub range_upper: f64,
    pub liquidity: f64,
    /// Token0 balance after settlement.
    pub balance_token0: f64,
    /// Token1 balance after settlement.
    pub balance_token1: f64,
    pub sold_token0: f64,
    pub bought_token0: f64,
    pub sold_token1: f64,
    pub bought_token1: f64,
    pub fees_token0: f64,
    pub fees_token1: f64,
}

/// Concentrated-liquidity band with per-step flow accumulators.
#[derive(Debug, Clone)]
pub struct RangeBand {
    side: BandSide,
    fee_rate: f64,
    range_lower: f64,
    range_upper: f64,
    liquidity: f64,
    balance_token0: f64,
    balance_token1: f64,
    last_spot_price: f64,
    sold_token0: f64,
    bought_token0: f64,
    sold_token1: f64,
    bought_token1: f64,
    fees_token0: f64,
    fees_token1: f64,
}

fn check_bounds(range_lower: f64, range_upper: f64) -> Result<()> {
    if !(range_lower.is_finite() && range_upper.is_finite()) {
        return Err(Error::degenerate_band(format!(
            "non-finite bounds [{range_lower}, {range_upper}]"
        )));
    }
    if range_lower <= 0.0 || range_upper <= range_lower {
        return Err(Error::degenerate_band(format!(
            "bounds must satisfy 0 < lower < upper, got [{range_lower}, {range_upper}]"
        )));
    }
    Ok(())
}

fn check_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::invalid_input(format!(
            "deposit must be finite and non-negative, got {amount}"
        )));
    }
    Ok(())
}

impl RangeBand {
    /// Mint a token0-only band. The reference price starts at the lower edge.
    pub fn token0(fee_rate: f64, range_lower: f64, range_upper: f64, amount: f64) -> Result<Self> {
        check_bounds(range_lower, range_upper)?;
        check_amount(amount)?;

        let (sl, su) = (range_lower.sqrt(), range_upper.sqrt());
        let liquidity = amount * sl * su / (su - sl);
        // Full sweep lower -> upper must not demand more token0 than deposited.
        let cap = amount / (1.0 / sl - 1.0 / su);
        let liquidity = liquidity.min(cap).max(0.0);

        Ok(Self::minted(
            BandSide::Upper,
            fee_rate,
            range_lower,
            range_upper,
            liquidity,
            amount,
            0.0,
            range_lower,
        ))
    }

    /// Mint a token1-only band. The reference price starts at the upper edge.
    pub fn token1(fee_rate: f64, range_lower: f64, range_upper: f64, amount: f64) -> Result<Self> {
        check_bounds(range_lower, range_upper)?;
        check_amount(amount)?;

        let (sl, su) = (range_lower.sqrt(), range_upper.sqrt());
        let liquidity = amount / (su - sl);
        let cap = amount / (su - sl);
        let liquidity = liquidity.min(cap).max(0.0);

        Ok(Self::minted(
            BandSide::Lower,
            fee_rate,
            range_lower,
            range_upper,
            liquidity,
            0.0,
            amount,
            range_upper,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn minted(
        side: BandSide,
        fee_rate: f64,
        range_lower: f64,
        range_upper: f64,
        liquidity: f64,
        balance_token0: f64,
        balance_token1: f64,
        last_spot_price: f64,
    ) -> Self {
        Self {
            side,
            fee_rate,
            range_lower,
            range_upper,
            liquidity,
            balance_token0,
            balance_token1,
            last_spot_price,
            sold_token0: 0.0,
            bought_token0: 0.0,
            sold_token1: 0.0,
            bought_token1: 0.0,
            fees_token0: 0.0,
            fees_token1: 0.0,
        }
    }

    #[inline]
    fn clip(&self, price: f64) -> f64 {
        price.clamp(self.range_lower, self.range_upper)
    }

    /// Move the band's price from its reference to `price`, accumulating flows.
    ///
    /// The reference price advances to `price` whether or not anything fills.
    /// Balances change only on [`settle`](Self::settle).
    pub fn swap(&mut self, price: f64) {
        let from = self.clip(self.last_spot_price);
        let to = self.clip(price);
        self.last_spot_price = price;

        if from == to || self.liquidity <= 0.0 {
            return;
        }

        let (s0, s1) = (from.sqrt(), to.sqrt());
        let delta0 = self.liquidity * (1.0 / s1 - 1.0 / s0);
        let delta1 = self.liquidity * (s1 - s0);

        if delta1 > 0.0 && delta0 < 0.0 {
            // Price up: the band gives token0, receives token1.
            let wanted = -delta0;
            let sold = wanted.min(self.available_token0());
            if sold > 0.0 {
                let ratio = sold / wanted;
                self.sold_token0 += sold;
                self.bought_token1 += delta1 * ratio;
                self.fees_token0 += sold * self.fee_rate;
            }
        } else if delta1 < 0.0 && delta0 > 0.0 {
            let wanted = -delta1;
            let sold = wanted.min(self.available_token1());
            if sold > 0.0 {
                let ratio = sold / wanted;
                self.sold_token1 += sold;
                self.bought_token0 += delta0 * ratio;
                self.fees_token1 += sold * self.fee_rate;
            }
        }
    }

    // Unsettled sales already committed in this step are not available again.
    #[inline]
    fn available_token0(&self) -> f64 {
        (self.balance_token0 + self.bought_token0 - self.sold_token0).max(0.0)
    }

    #[inline]
    fn available_token1(&self) -> f64 {
        (self.balance_token1 + self.bought_token1 - self.sold_token1).max(0.0)
    }

    /// Apply accumulated flows and fees to the balances and reset the step.
    ///
    /// Liquidity is left untouched.
    pub fn settle(&mut self) -> BandRecord {
        self.balance_token0 += -self.sold_token0 + self.bought_token0 + self.fees_token0;
        self.balance_token1 += -self.sold_token1 + self.bought_token1 + self.fees_token1;

        let record = BandRecord {
            side: self.side,
            range_lower: self.range_lower,
            range_upper: self.range_upper,
            liquidity: self.liquidity,
            balance_token0: self.balance_token0,
            balance_token1: self.balance_token1,
            sold_token0: self.sold_token0,
            bought_token0: self.bought_token0,
            sold_token1: self.sold_token1,
            bought_token1: self.bought_token1,
            fees_token0: self.fees_token0,
            fees_token1: self.fees_token1,
        };

        self.sold_token0 = 0.0;
        self.bought_token0 = 0.0;
        self.sold_token1 = 0.0;
        self.bought_token1 = 0.0;
        self.fees_token0 = 0.0;
        self.fees_token1 = 0.0;

        record
    }

    pub fn side(&self) -> BandSide {
        self.side
    }

    pub fn fee_rate(&self) -> f64 {
        self.fee_rate
    }

    pub fn range_lower(&self) -> f64 {
        self.range_lower
    }

    pub fn range_upper(&self) -> f64 {
        self.range_upper
    }

    pub fn liquidity(&self) -> f64 {
        self.liquidity
    }

    pub fn balance_token0(&self) -> f64 {
        self.balance_token0
    }

    pub fn balance_token1(&self) -> f64 {
        self.balance_token1
    }

    pub fn last_spot_price(&self) -> f64 {
        self.last_spot_price
    }
}
