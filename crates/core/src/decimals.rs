//! Token decimals lookup.
//!
//! Inventory models receive balances in smallest units and ask this collaborator
//! how to scale them. Live deployments back it with an RPC client; the backtest
//! uses [`FixedDecimals`].

use crate::error::{Error, Result};

/// Resolves the number of decimals for a token address.
pub trait TokenDecimals: Send + Sync {
    /// Decimals for `address`.
    fn token_decimals(&self, address: &str) -> Result<u8>;
}

/// Reports the same decimals for every token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDecimals(pub u8);

impl Default for FixedDecimals {
    fn default() -> Self {
        Self(18)
    }
}

impl TokenDecimals for FixedDecimals {
    fn token_decimals(&self, _address: &str) -> Result<u8> {
        Ok(self.0)
    }
}

/// Scale factor `10^decimals`.
#[inline]
pub fn scale(decimals: u8) -> f64 {
    10f64.powi(decimals as i32)
}

/// Raw smallest-unit amount to human units.
#[inline]
pub fn to_human(raw: f64, decimals: u8) -> f64 {
    raw / scale(decimals)
}

/// Human amount to raw smallest units.
#[inline]
pub fn to_raw(amount: f64, decimals: u8) -> f64 {
    amount * scale(decimals)
}

/// Look up decimals for both tokens of a pair.
pub fn pair_decimals(
    lookup: &dyn TokenDecimals,
    token0_address: &str,
    token1_address: &str,
) -> Result<(u8, u8)> {
    let d0 = lookup.token_decimals(token0_address)?;
    let d1 = lookup.token_decimals(token1_address)?;
    if d0 > 36 || d1 > 36 {
        return Err(Error::decimals(format!(
            "unsupported decimals {d0}/{d1} for {token0_address}/{token1_address}"
        )));
    }
    Ok((d0, d1))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl TokenDecimals for Broken {
        fn token_decimals(&self, address: &str) -> Result<u8> {
            Err(Error::decimals(format!("no contract at {address}")))
        }
    }

    #[test]
    fn test_fixed_decimals() {
        let (d0, d1) = pair_decimals(&FixedDecimals(6), "a", "b").unwrap();
        assert_eq!((d0, d1), (6, 6));
    }

    #[test]
    fn test_scaling() {
        assert!((to_human(1.5e18, 18) - 1.5).abs() < 1e-12);
        assert!((to_raw(2.0, 6) - 2_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_lookup_failure_propagates() {
        assert!(matches!(
            pair_decimals(&Broken, "a", "b"),
            Err(Error::Decimals(_))
        ));
        assert!(pair_decimals(&FixedDecimals(40), "a", "b").is_err());
    }
}
