use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, warn};

use common::{Bar, Error, MarketDataProvider, Result, Series, Timeframe};

use crate::artifact;

/// Maximum bars requested per provider call.
pub const PAGE_LIMIT: usize = 1000;

/// Upper bound on pages pulled by a single fetch.
const MAX_PAGES: usize = 64;

/// Persisted OHLCV history per (instrument, timeframe).
///
/// Each key maps to one CSV artifact under `dir`. Callers must not refresh
/// the same key concurrently; the scanner guarantees this by running one
/// cycle at a time and one task per key.
pub struct SeriesStore {
    dir: PathBuf,
    provider: Arc<dyn MarketDataProvider>,
}

impl SeriesStore {
    pub fn new(dir: impl Into<PathBuf>, provider: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            dir: dir.into(),
            provider,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `{instrument}_{timeframe}_historical_data.csv`, the name existing
    /// data directories already use.
    pub fn artifact_path(&self, instrument: &str, timeframe: Timeframe) -> PathBuf {
        self.dir.join(format!("{instrument}_{timeframe}_historical_data.csv"))
    }

    /// Read the on-disk series, or bulk-fetch the lookback window and
    /// persist it when no usable artifact exists.
    pub async fn try_load(&self, instrument: &str, timeframe: Timeframe) -> Result<Series> {
        let path = self.artifact_path(instrument, timeframe);
        if path.exists() {
            let series = read_artifact(path.clone()).await?;
            if !series.is_empty() {
                debug!(%instrument, %timeframe, bars = series.len(), "Loaded series from disk");
                return Ok(series);
            }
            warn!(path = %path.display(), "Artifact has no usable rows, refetching");
        }

        info!(%instrument, %timeframe, "No local history, fetching lookback window");
        let start = Utc::now() - timeframe.lookback();
        let bars = self.fetch_since(instrument, timeframe, start).await?;
        let series = Series::new(bars);
        if !series.is_empty() {
            self.persist(path, &series).await;
        }
        Ok(series)
    }

    /// Fail-soft `try_load`: any error yields an empty series.
    pub async fn load(&self, instrument: &str, timeframe: Timeframe) -> Series {
        match self.try_load(instrument, timeframe).await {
            Ok(series) => series,
            Err(e) => {
                error!(%instrument, %timeframe, error = %e, "Failed to load series");
                Series::empty()
            }
        }
    }

    /// Fetch bars strictly newer than the series' last bar, merge and
    /// persist. An empty series degrades to `try_load`.
    pub async fn try_refresh(
        &self,
        series: &Series,
        instrument: &str,
        timeframe: Timeframe,
    ) -> Result<Series> {
        let Some(last) = series.last() else {
            info!(%instrument, %timeframe, "Series empty, reloading");
            return self.try_load(instrument, timeframe).await;
        };

        let start = last.timestamp + Duration::milliseconds(1);
        let fresh = self.fetch_since(instrument, timeframe, start).await?;
        if fresh.is_empty() {
            debug!(%instrument, %timeframe, "No new bars");
            return Ok(series.clone());
        }

        let fetched = fresh.len();
        let merged = series.merge(fresh);
        self.persist(self.artifact_path(instrument, timeframe), &merged)
            .await;
        info!(%instrument, %timeframe, fetched, total = merged.len(), "Series refreshed");
        Ok(merged)
    }

    /// Fail-soft `try_refresh`: on error the input series is returned unchanged.
    pub async fn refresh(&self, series: Series, instrument: &str, timeframe: Timeframe) -> Series {
        match self.try_refresh(&series, instrument, timeframe).await {
            Ok(updated) => updated,
            Err(e) => {
                error!(%instrument, %timeframe, error = %e, "Failed to refresh series");
                series
            }
        }
    }

    /// Load then refresh: the up-to-date series for one key.
    pub async fn ensure_fresh(&self, instrument: &str, timeframe: Timeframe) -> Series {
        let series = self.load(instrument, timeframe).await;
        let series = self.refresh(series, instrument, timeframe).await;
        debug!(%instrument, %timeframe, bars = series.len(), "Series ready");
        series
    }

    /// Page through the provider from `start` until a short page arrives.
    async fn fetch_since(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        mut start: DateTime<Utc>,
    ) -> Result<Vec<Bar>> {
        let mut bars = Vec::new();
        for _ in 0..MAX_PAGES {
            let page = self
                .provider
                .fetch_bars(instrument, timeframe, start, PAGE_LIMIT)
                .await?;
            let Some(last) = page.last() else { break };
            let next = last.timestamp + Duration::milliseconds(1);
            let full_page = page.len() >= PAGE_LIMIT;
            bars.extend(page);
            if !full_page || next <= start {
                break;
            }
            start = next;
        }
        Ok(bars)
    }

    async fn persist(&self, path: PathBuf, series: &Series) {
        let path_display = path.display().to_string();
        let series = series.clone();
        let written = tokio::task::spawn_blocking(move || artifact::write(&path, &series))
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))
            .and_then(|r| r);
        if let Err(e) = written {
            error!(path = %path_display, error = %e, "Failed to persist series");
        }
    }
}

/// Artifact reads run on the blocking pool.
async fn read_artifact(path: PathBuf) -> Result<Series> {
    tokio::task::spawn_blocking(move || artifact::read(&path))
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?
}
