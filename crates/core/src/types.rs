//! Core data types for the asymmetric LP system.

use crate::error::{Error, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp in milliseconds since Unix epoch (UTC).
pub type TimestampMs = i64;

/// Convert a millisecond timestamp into a UTC datetime.
///
/// Out-of-range timestamps map to the Unix epoch.
#[inline]
pub fn ts_to_datetime(ts_ms: TimestampMs) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ts_ms)
        .single()
        .unwrap_or_default()
}

/// OHLCV bar. Only `ts_ms` and `close` drive the simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OhlcBar {
    /// Bar timestamp (ms).
    pub ts_ms: TimestampMs,
    /// Open price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Close price.
    pub close: f64,
    /// Traded volume.
    pub volume: f64,
}

impl OhlcBar {
    /// Bar carrying a single price in every OHLC field.
    pub fn flat(ts_ms: TimestampMs, price: f64) -> Self {
        Self {
            ts_ms,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 0.0,
        }
    }

    /// Close as a price point.
    #[inline]
    pub fn price_point(&self) -> PricePoint {
        PricePoint {
            ts_ms: self.ts_ms,
            price: self.close,
        }
    }
}

/// Ordered, validated series of bars.
///
/// Timestamps are strictly increasing and every close is finite and positive.
#[derive(Debug, Clone, Serialize)]
pub struct BarSeries {
    bars: Vec<OhlcBar>,
}

impl BarSeries {
    /// Validate an already ordered series.
    pub fn new(bars: Vec<OhlcBar>) -> Result<Self> {
        if bars.is_empty() {
            return Err(Error::data("bar series is empty"));
        }
        for (i, bar) in bars.iter().enumerate() {
            if !(bar.close.is_finite() && bar.close > 0.0) {
                return Err(Error::data(format!(
                    "bar {i} at {} has invalid close {}",
                    bar.ts_ms, bar.close
                )));
            }
            if i > 0 && bar.ts_ms <= bars[i - 1].ts_ms {
                return Err(Error::data(format!(
                    "bar {i} timestamp {} does not follow {}",
                    bar.ts_ms,
                    bars[i - 1].ts_ms
                )));
            }
        }
        Ok(Self { bars })
    }

    /// Sort by timestamp, then validate. Duplicate timestamps are still rejected.
    pub fn from_unsorted(mut bars: Vec<OhlcBar>) -> Result<Self> {
        bars.sort_by_key(|b| b.ts_ms);
        Self::new(bars)
    }

    /// Build a series from `(ts_ms, close)` pairs.
    pub fn from_closes(points: &[(TimestampMs, f64)]) -> Result<Self> {
        Self::new(
            points
                .iter()
                .map(|&(ts, price)| OhlcBar::flat(ts, price))
                .collect(),
        )
    }

    /// Inclusive sub-series between two timestamps.
    pub fn between(&self, start_ms: TimestampMs, end_ms: TimestampMs) -> Result<Self> {
        let bars: Vec<OhlcBar> = self
            .bars
            .iter()
            .filter(|b| b.ts_ms >= start_ms && b.ts_ms <= end_ms)
            .cloned()
            .collect();
        if bars.is_empty() {
            return Err(Error::data(format!(
                "no bars between {start_ms} and {end_ms}"
            )));
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[OhlcBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// First bar. A validated series is never empty.
    pub fn first(&self) -> &OhlcBar {
        &self.bars[0]
    }

    pub fn last(&self) -> &OhlcBar {
        &self.bars[self.bars.len() - 1]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OhlcBar> {
        self.bars.iter()
    }
}

impl<'a> IntoIterator for &'a BarSeries {
    type Item = &'a OhlcBar;
    type IntoIter = std::slice::Iter<'a, OhlcBar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}

/// A timestamped price observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Timestamp (ms).
    pub ts_ms: TimestampMs,
    /// Price (token1 per token0).
    pub price: f64,
}

/// Direction of a detected swap, from the taker's point of view on token0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeType {
    /// Price moved up: takers bought token0 from the pool.
    Buy,
    /// Price moved down: takers sold token0 into the pool.
    Sell,
}

/// A swap detected by the AMM simulator on one bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapEvent {
    /// Bar timestamp.
    pub ts_ms: TimestampMs,
    /// Close price the pool swapped to.
    pub price: f64,
    /// Buy when price rose, Sell otherwise.
    pub trade_type: TradeType,
    /// Traded amount in token0 units.
    pub volume: f64,
    /// Fractional move from the previous reference price.
    pub price_change: f64,
    /// Token0 sold by the pool across all bands.
    pub sold_token0: f64,
    /// Token0 bought by the pool across all bands.
    pub bought_token0: f64,
    /// Token1 sold by the pool across all bands.
    pub sold_token1: f64,
    /// Token1 bought by the pool across all bands.
    pub bought_token1: f64,
    /// Fees credited in token0.
    pub fees_token0: f64,
    /// Fees credited in token1.
    pub fees_token1: f64,
    /// Aggregate token0 held by active bands after the swap.
    pub new_token0_balance: f64,
    /// Aggregate token1 held by active bands after the swap.
    pub new_token1_balance: f64,
}

impl SwapEvent {
    /// Fees expressed in token1 (quote) units at the swap price.
    #[inline]
    pub fn fees_in_token1(&self) -> f64 {
        self.fees_token0 * self.price + self.fees_token1
    }
}

/// Token0 share of total value (in token1 units): `t0·p / (t0·p + t1)`.
///
/// Returns 0.5 when the portfolio is empty.
#[inline]
pub fn inventory_ratio(token0: f64, token1: f64, price: f64) -> f64 {
    let value0 = token0 * price;
    let total = value0 + token1;
    if total > 0.0 && total.is_finite() {
        value0 / total
    } else {
        0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_bars(points: &[(i64, f64)]) -> Vec<OhlcBar> {
        points.iter().map(|&(ts, p)| OhlcBar::flat(ts, p)).collect()
    }

    #[test]
    fn test_series_rejects_unsorted() {
        let bars = make_bars(&[(60_000, 100.0), (0, 101.0)]);
        assert!(matches!(BarSeries::new(bars), Err(Error::Data(_))));
    }

    #[test]
    fn test_series_from_unsorted_sorts() {
        let bars = make_bars(&[(120_000, 102.0), (0, 100.0), (60_000, 101.0)]);
        let series = BarSeries::from_unsorted(bars).unwrap();
        let ts: Vec<i64> = series.iter().map(|b| b.ts_ms).collect();
        assert_eq!(ts, vec![0, 60_000, 120_000]);
    }

    #[test]
    fn test_series_rejects_duplicates_and_bad_close() {
        assert!(BarSeries::from_unsorted(make_bars(&[(0, 100.0), (0, 101.0)])).is_err());
        assert!(BarSeries::new(make_bars(&[(0, 100.0), (1, 0.0)])).is_err());
        assert!(BarSeries::new(make_bars(&[(0, f64::NAN)])).is_err());
        assert!(BarSeries::new(Vec::new()).is_err());
    }

    #[test]
    fn test_series_between() {
        let series =
            BarSeries::from_closes(&[(0, 100.0), (60_000, 101.0), (120_000, 102.0)]).unwrap();
        let sub = series.between(60_000, 120_000).unwrap();
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.first().close, 101.0);
        assert!(series.between(500_000, 600_000).is_err());
    }

    #[test]
    fn test_inventory_ratio() {
        assert_relative_eq!(inventory_ratio(1.0, 3000.0, 3000.0), 0.5, epsilon = 1e-12);
        assert_eq!(inventory_ratio(0.0, 0.0, 3000.0), 0.5);
        assert_relative_eq!(inventory_ratio(1.0, 0.0, 3000.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(inventory_ratio(2.0, 100.0, 100.0), 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ts_to_datetime() {
        // 2024-01-01T00:00:00Z
        let dt = ts_to_datetime(1_704_067_200_000);
        assert_eq!(dt.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }
}
