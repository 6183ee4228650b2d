//! Token split targeting applied before a non-initial mint.
//!
//! Pure accounting: the excess of one token is converted to the other at the
//! current price, capped by what is available. No swap is executed.

/// Move balances toward per-token unit targets.
///
/// Token0 is corrected first using token1, then token1 using token0.
/// The first pass is capped by token1 on hand, so without token1 a token0
/// surplus only moves when token1 is below its own target.
pub fn toward_initial_units(
    token0: f64,
    token1: f64,
    price: f64,
    target0: f64,
    target1: f64,
) -> (f64, f64) {
    let (mut t0, mut t1) = (token0, token1);

    if t0 > target0 {
        let token1_to_buy = (t0 - target0) * price;
        let converted = token1_to_buy.min(t1);
        t0 -= converted / price;
        t1 += converted;
    } else if t0 < target0 {
        let token1_to_sell = ((target0 - t0) * price).min(t1);
        t0 += token1_to_sell / price;
        t1 -= token1_to_sell;
    }

    if t1 > target1 {
        let token0_to_buy = (t1 - target1) / price;
        let converted = token0_to_buy.min(t0);
        t1 -= converted * price;
        t0 += converted;
    } else if t1 < target1 {
        let token0_to_sell = ((target1 - t1) / price).min(t0);
        t1 += token0_to_sell * price;
        t0 -= token0_to_sell;
    }

    (t0.max(0.0), t1.max(0.0))
}

/// Move balances toward a token0 value share of `target_ratio`.
pub fn toward_value_ratio(token0: f64, token1: f64, price: f64, target_ratio: f64) -> (f64, f64) {
    let value0 = token0 * price;
    let total = value0 + token1;
    if total <= 0.0 {
        return (token0, token1);
    }

    let excess0 = value0 - total * target_ratio;
    let excess1 = token1 - total * (1.0 - target_ratio);

    if excess0 > 0.0 {
        let sell0 = (excess0 / price).min(token0);
        (token0 - sell0, token1 + sell0 * price)
    } else if excess1 > 0.0 {
        let sell1 = excess1.min(token1);
        (token0 + sell1 / price, token1 - sell1)
    } else {
        (token0, token1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_value_ratio_sells_excess_token0() {
        // 2 token0 @ 100 = 200 vs 100 token1 -> target 150/150.
        let (t0, t1) = toward_value_ratio(2.0, 100.0, 100.0, 0.5);
        assert_relative_eq!(t0, 1.5, epsilon = 1e-12);
        assert_relative_eq!(t1, 150.0, epsilon = 1e-9);
    }

    #[test]
    fn test_value_ratio_sells_excess_token1() {
        let (t0, t1) = toward_value_ratio(0.0, 300.0, 100.0, 0.5);
        assert_relative_eq!(t0, 1.5, epsilon = 1e-12);
        assert_relative_eq!(t1, 150.0, epsilon = 1e-9);
    }

    #[test]
    fn test_value_ratio_preserves_value() {
        let (t0, t1) = toward_value_ratio(3.0, 50.0, 120.0, 0.3);
        assert_relative_eq!(t0 * 120.0 + t1, 3.0 * 120.0 + 50.0, epsilon = 1e-9);
        assert_relative_eq!(t0 * 120.0 / (t0 * 120.0 + t1), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_initial_units_restores_units_when_affordable() {
        // Started with 1 token0 / 100 token1; price moved to 100 and we now hold 0.5 / 150.
        let (t0, t1) = toward_initial_units(0.5, 150.0, 100.0, 1.0, 100.0);
        assert_relative_eq!(t0, 1.0, epsilon = 1e-12);
        assert_relative_eq!(t1, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_initial_units_token0_excess_funds_token1() {
        let (t0, t1) = toward_initial_units(2.0, 0.0, 100.0, 1.0, 100.0);
        assert_relative_eq!(t0, 1.0, epsilon = 1e-12);
        assert_relative_eq!(t1, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_initial_units_surplus_kept_without_token1_need() {
        // No token1 held and no token1 target: nothing to convert against.
        let (t0, t1) = toward_initial_units(2.0, 0.0, 100.0, 1.0, 0.0);
        assert_eq!(t0, 2.0);
        assert_eq!(t1, 0.0);
    }

    #[test]
    fn test_initial_units_capped_by_balance() {
        let (t0, t1) = toward_initial_units(0.3, 0.0, 100.0, 1.0, 100.0);
        assert!(t0.abs() < 1e-12);
        assert_relative_eq!(t1, 30.0, epsilon = 1e-9);
    }
}
