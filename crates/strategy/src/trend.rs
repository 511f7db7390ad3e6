use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use common::{Error, Result, Trend};

use crate::indicators::moving_average::sma;

pub const TREND_FAST: usize = 50;
pub const TREND_SLOW: usize = 200;

/// Classify the regime from closes on the trend timeframe:
/// SMA50 above SMA200 is an uptrend, below is a downtrend, equal is sideways.
pub fn classify_trend(closes: &[f64]) -> Result<Trend> {
    if closes.len() < TREND_SLOW {
        return Err(Error::InsufficientData {
            needed: TREND_SLOW,
            available: closes.len(),
        });
    }
    let last = |values: Vec<Option<f64>>| values.last().copied().flatten();
    let (Some(fast), Some(slow)) = (last(sma(closes, TREND_FAST)), last(sma(closes, TREND_SLOW)))
    else {
        return Err(Error::InsufficientData {
            needed: TREND_SLOW,
            available: closes.len(),
        });
    };
    if !fast.is_finite() || !slow.is_finite() {
        return Err(Error::IndicatorCompute(format!(
            "trend averages not finite (fast={fast}, slow={slow})"
        )));
    }

    Ok(if fast > slow {
        Trend::Uptrend
    } else if fast < slow {
        Trend::Downtrend
    } else {
        Trend::Sideways
    })
}

/// Last computed trend for one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendRecord {
    pub instrument: String,
    pub trend: Trend,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Fresh(Trend),
    Stale,
}

/// Per-instrument trend cache. Cloning shares the same underlying map.
///
/// Owned by the caller and injected wherever trends are needed; records live
/// for the process lifetime only.
#[derive(Debug, Clone, Default)]
pub struct TrendCache {
    records: Arc<RwLock<HashMap<String, TrendRecord>>>,
}

impl TrendCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Fresh` while the record is younger than `max_age` at `now`.
    pub async fn state(&self, instrument: &str, max_age: Duration, now: DateTime<Utc>) -> CacheState {
        match self.records.read().await.get(instrument) {
            Some(record) if now - record.computed_at < max_age => CacheState::Fresh(record.trend),
            _ => CacheState::Stale,
        }
    }

    /// Overwrite the record for `instrument`.
    pub async fn record(&self, instrument: &str, trend: Trend, now: DateTime<Utc>) -> TrendRecord {
        let record = TrendRecord {
            instrument: instrument.to_string(),
            trend,
            computed_at: now,
        };
        self.records
            .write()
            .await
            .insert(instrument.to_string(), record.clone());
        record
    }

    pub async fn get(&self, instrument: &str) -> Option<TrendRecord> {
        self.records.read().await.get(instrument).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn rising_closes_are_an_uptrend() {
        let closes: Vec<f64> = (0..250).map(|i| 100.0 + i as f64).collect();
        assert_eq!(classify_trend(&closes).unwrap(), Trend::Uptrend);
    }

    #[test]
    fn falling_closes_are_a_downtrend() {
        let closes: Vec<f64> = (0..250).map(|i| 500.0 - i as f64).collect();
        assert_eq!(classify_trend(&closes).unwrap(), Trend::Downtrend);
    }

    #[test]
    fn flat_closes_are_sideways() {
        assert_eq!(classify_trend(&[42.0; 200]).unwrap(), Trend::Sideways);
    }

    #[test]
    fn fewer_than_slow_window_is_undetermined() {
        let err = classify_trend(&[1.0; 199]).unwrap_err();
        assert!(matches!(err, Error::InsufficientData { needed: 200, available: 199 }));
    }

    #[tokio::test]
    async fn cache_goes_stale_after_one_interval() {
        let cache = TrendCache::new();
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let hour = Duration::hours(1);

        assert_eq!(cache.state("BTCUSDT", hour, t0).await, CacheState::Stale);

        cache.record("BTCUSDT", Trend::Uptrend, t0).await;
        assert_eq!(
            cache.state("BTCUSDT", hour, t0 + Duration::minutes(59)).await,
            CacheState::Fresh(Trend::Uptrend)
        );
        assert_eq!(cache.state("BTCUSDT", hour, t0 + hour).await, CacheState::Stale);
        assert_eq!(cache.state("ETHUSDT", hour, t0).await, CacheState::Stale);
    }

    #[tokio::test]
    async fn clones_share_records() {
        let cache = TrendCache::new();
        let other = cache.clone();
        let now = Utc::now();
        cache.record("SOLUSDT", Trend::Downtrend, now).await;
        assert_eq!(other.get("SOLUSDT").await.unwrap().trend, Trend::Downtrend);
    }
}
