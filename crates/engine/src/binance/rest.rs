use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use common::{Bar, Error, MarketDataProvider, Result, Timeframe};

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Largest page the klines endpoint serves.
pub const MAX_KLINES_LIMIT: usize = 1000;

/// Public REST client for Binance market data. No credentials are needed
/// for klines.
pub struct BinanceClient {
    base_url: String,
    http: Client,
}

impl BinanceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String> {
        let url = format!("{}{path}", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Fetch(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Fetch(format!("HTTP {status}: {body}")));
        }
        Ok(body)
    }
}

#[async_trait]
impl MarketDataProvider for BinanceClient {
    async fn fetch_bars(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Bar>> {
        let query = [
            ("symbol", instrument.to_string()),
            ("interval", timeframe.label().to_string()),
            ("startTime", start.timestamp_millis().to_string()),
            ("limit", limit.clamp(1, MAX_KLINES_LIMIT).to_string()),
        ];
        debug!(%instrument, %timeframe, %start, "Requesting klines");
        let body = self.get("/api/v3/klines", &query).await?;
        parse_klines(&body)
    }
}

// ─── Response parsing ────────────────────────────────────────────────────────

/// Parse a klines payload: an array of
/// `[open_time, open, high, low, close, volume, close_time, ...]` rows with
/// prices as decimal strings.
pub fn parse_klines(body: &str) -> Result<Vec<Bar>> {
    let rows: Vec<Vec<Value>> =
        serde_json::from_str(body).map_err(|e| Error::Parse(format!("klines payload: {e}")))?;

    let mut bars = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(timestamp) = row
            .first()
            .and_then(Value::as_i64)
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        else {
            warn!(?row, "Skipping kline without a valid open time");
            continue;
        };
        bars.push(Bar {
            timestamp,
            open: number_at(&row, 1),
            high: number_at(&row, 2),
            low: number_at(&row, 3),
            close: number_at(&row, 4),
            volume: number_at(&row, 5),
        });
    }
    Ok(bars)
}

/// Numeric cell as f64; missing or unparseable cells become NaN.
fn number_at(row: &[Value], index: usize) -> f64 {
    match row.get(index) {
        Some(Value::String(s)) => s.parse().unwrap_or(f64::NAN),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_prices() {
        let body = r#"[[1704067200000,"42000.5","42100.0","41900.0","42050.25","12.5",1704067259999,"0",10,"0","0","0"]]"#;
        let bars = parse_klines(body).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(bars[0].open, 42000.5);
        assert_eq!(bars[0].close, 42050.25);
        assert_eq!(bars[0].volume, 12.5);
    }

    #[test]
    fn unparseable_price_becomes_nan() {
        let body = r#"[[1704067200000,"abc","2","0.5","1.5","3"]]"#;
        let bars = parse_klines(body).unwrap();
        assert!(bars[0].open.is_nan());
        assert_eq!(bars[0].high, 2.0);
    }

    #[test]
    fn row_without_open_time_is_skipped() {
        let body = r#"[["x","1","2","0.5","1.5","3"],[1704067200000,"1","2","0.5","1.5","3"]]"#;
        assert_eq!(parse_klines(body).unwrap().len(), 1);
    }

    #[test]
    fn error_payload_is_a_parse_error() {
        let err = parse_klines(r#"{"code":-1121,"msg":"Invalid symbol."}"#).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn empty_array_is_no_bars() {
        assert!(parse_klines("[]").unwrap().is_empty());
    }
}
