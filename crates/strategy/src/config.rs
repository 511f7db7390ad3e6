use serde::{Deserialize, Serialize};

use common::{Error, Result, Timeframe};

/// Instruments and timeframes scanned each cycle.
///
/// Example `config/watchlist.toml`:
/// ```toml
/// symbols = ["BTCUSDT", "ETHUSDT"]
/// timeframes = ["15m", "1h"]
/// trend_timeframe = "1h"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchlistConfig {
    pub symbols: Vec<String>,
    pub timeframes: Vec<Timeframe>,
    /// Timeframe whose SMA50/SMA200 decides the trend.
    pub trend_timeframe: Timeframe,
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        Self {
            symbols: ["BTCUSDT", "TONUSDT", "PEPEUSDT", "SOLUSDT", "NEARUSDT", "ETHUSDT", "DOGEUSDT"]
                .into_iter()
                .map(String::from)
                .collect(),
            timeframes: vec![Timeframe::M15, Timeframe::M30, Timeframe::H1, Timeframe::D1],
            trend_timeframe: Timeframe::H1,
        }
    }
}

impl WatchlistConfig {
    /// Load from a TOML file, or the built-in watchlist when `path` is `None`.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read watchlist at '{path}': {e}")))?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("invalid watchlist at '{path}': {e}")))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        if config.symbols.is_empty() {
            return Err(Error::Config("watchlist has no symbols".into()));
        }
        if config.timeframes.is_empty() {
            return Err(Error::Config("watchlist has no timeframes".into()));
        }
        Ok(config)
    }
}
