//! Signal generation: candlestick classification, indicator enrichment,
//! trend classification and indicator voting.

pub mod candlestick;
pub mod config;
pub mod indicators;
pub mod pipeline;
pub mod trend;
pub mod voting;

pub use config::WatchlistConfig;
pub use pipeline::{analyze, EnrichedRow, IndicatorTable};
pub use trend::{classify_trend, CacheState, TrendCache, TrendRecord};
pub use voting::{evaluate, tally, Decision, Votes};
