//! Tick grid helpers (`price = 1.0001^tick`).

/// Price ratio between adjacent ticks.
pub const TICK_BASE: f64 = 1.0001;

/// Largest tick index on the grid.
pub const MAX_TICK: i32 = 887_272;

/// Tick at or below `price`: `floor(ln(price) / ln(1.0001))`.
#[inline]
pub fn price_to_tick(price: f64) -> i32 {
    let tick = (price.ln() / TICK_BASE.ln()).floor();
    tick.clamp(-(MAX_TICK as f64), MAX_TICK as f64) as i32
}

/// Price at a tick.
#[inline]
pub fn tick_to_price(tick: i32) -> f64 {
    TICK_BASE.powi(tick)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_price_is_tick_zero() {
        assert_eq!(price_to_tick(1.0), 0);
        assert_eq!(tick_to_price(0), 1.0);
    }

    #[test]
    fn test_tick_floors() {
        let tick = price_to_tick(3000.0);
        assert!(tick_to_price(tick) <= 3000.0 * (1.0 + 1e-12));
        assert!(tick_to_price(tick + 1) > 3000.0);
    }

    #[test]
    fn test_negative_ticks_below_one() {
        let tick = price_to_tick(0.5);
        assert!(tick < 0);
        assert!(tick_to_price(tick + 1) > 0.5);
    }
}
