use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use common::{Timeframe, Trend};
use store::SeriesStore;
use strategy::{classify_trend, CacheState, TrendCache};

/// Trend lookups backed by the series store and a shared staleness cache.
///
/// A cached trend is reused until it is one trend-timeframe interval old;
/// after that the trend series is refreshed and reclassified.
#[derive(Clone)]
pub struct TrendClassifier {
    store: Arc<SeriesStore>,
    cache: TrendCache,
    timeframe: Timeframe,
}

impl TrendClassifier {
    pub fn new(store: Arc<SeriesStore>, cache: TrendCache, timeframe: Timeframe) -> Self {
        Self {
            store,
            cache,
            timeframe,
        }
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub async fn trend(&self, instrument: &str) -> Option<Trend> {
        self.trend_at(instrument, Utc::now()).await
    }

    /// Trend for `instrument` as of `now`, or `None` when it cannot be
    /// determined. An undetermined trend is not cached.
    pub async fn trend_at(&self, instrument: &str, now: DateTime<Utc>) -> Option<Trend> {
        let timeframe = self.timeframe;
        if let CacheState::Fresh(trend) = self.cache.state(instrument, timeframe.interval(), now).await {
            debug!(%instrument, %trend, "Using cached trend");
            return Some(trend);
        }

        let series = self.store.ensure_fresh(instrument, timeframe).await;
        match classify_trend(&series.closes()) {
            Ok(trend) => {
                self.cache.record(instrument, trend, now).await;
                info!(%instrument, %timeframe, %trend, "Trend updated");
                Some(trend)
            }
            Err(e) => {
                warn!(%instrument, %timeframe, error = %e, "Trend undetermined");
                None
            }
        }
    }
}
