//! Delimited-text codec for persisted series.
//!
//! Layout: `timestamp,open,high,low,close,volume`, one row per bar, ascending.
//! Reading is tolerant: columns are located by header name, extra columns are
//! ignored, unparseable numbers become NaN and rows with an unreadable
//! timestamp are skipped.

use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tracing::warn;

use common::{Bar, Error, Result, Series};

const HEADER: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

pub fn read(path: &Path) -> Result<Series> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let ts_col = column("timestamp").ok_or_else(|| {
        Error::Parse(format!("{}: missing 'timestamp' column", path.display()))
    })?;
    let [open_col, high_col, low_col, close_col, volume_col] =
        ["open", "high", "low", "close", "volume"].map(column);

    let mut bars = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!(path = %path.display(), line = line + 2, error = %e, "Skipping unreadable row");
                continue;
            }
        };
        let Some(timestamp) = record.get(ts_col).and_then(parse_timestamp) else {
            warn!(path = %path.display(), line = line + 2, "Skipping row with invalid timestamp");
            continue;
        };
        let number = |col: Option<usize>| {
            col.and_then(|c| record.get(c))
                .and_then(|v| v.parse::<f64>().ok())
                .unwrap_or(f64::NAN)
        };
        bars.push(Bar {
            timestamp,
            open: number(open_col),
            high: number(high_col),
            low: number(low_col),
            close: number(close_col),
            volume: number(volume_col),
        });
    }

    Ok(Series::new(bars))
}

/// Overwrite the artifact with the full series. Writes a sibling temp file
/// and renames it over the target.
pub fn write(path: &Path, series: &Series) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let tmp = path.with_extension("csv.tmp");

    let mut writer = csv::Writer::from_path(&tmp)?;
    writer.write_record(HEADER)?;
    for bar in series.bars() {
        writer.write_record([
            bar.timestamp.to_rfc3339(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ])?;
    }
    writer.flush()?;
    drop(writer);

    fs::rename(&tmp, path)?;
    Ok(())
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[+00:00]` or epoch milliseconds.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_supported_timestamp_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 15, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01T12:15:00+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T12:15:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 12:15:00+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 12:15:00"), Some(expected));
        assert_eq!(
            parse_timestamp(&expected.timestamp_millis().to_string()),
            Some(expected)
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn write_then_read_preserves_bars() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("BTCUSDT_1h.csv");
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let series = Series::new(
            (0..3)
                .map(|i| Bar {
                    timestamp: t0 + chrono::Duration::hours(i),
                    open: 1.5 + i as f64,
                    high: 2.25,
                    low: 0.125,
                    close: 1.0 / 3.0,
                    volume: 1e-8,
                })
                .collect(),
        );

        write(&path, &series).unwrap();
        assert_eq!(read(&path).unwrap(), series);
        assert!(!path.with_extension("csv.tmp").exists());
    }

    #[test]
    fn coerces_bad_numbers_and_skips_bad_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.csv");
        fs::write(
            &path,
            "timestamp,open,high,low,close,volume,close_time\n\
             2024-01-01 00:00:00+00:00,1,2,0.5,1.5,10,123\n\
             not-a-date,1,2,0.5,1.5,10,123\n\
             2024-01-01 01:00:00+00:00,1,abc,0.5,,10,123\n",
        )
        .unwrap();

        let series = read(&path).unwrap();
        assert_eq!(series.len(), 2);
        let second = series.bars()[1];
        assert_eq!(second.open, 1.0);
        assert!(second.high.is_nan());
        assert!(second.close.is_nan());
        assert_eq!(second.volume, 10.0);
    }

    #[test]
    fn missing_timestamp_column_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "time,open\n1,2\n").unwrap();
        assert!(matches!(read(&path), Err(Error::Parse(_))));
    }
}
