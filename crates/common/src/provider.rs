use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Bar, Result, Timeframe};

/// Abstraction over the market-data source.
///
/// `BinanceClient` implements this against the public REST API.
/// Tests substitute an in-memory implementation.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch up to `limit` bars whose open time is at or after `start`,
    /// oldest first. Errors are reported as `Error::Fetch`.
    async fn fetch_bars(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Bar>>;
}
