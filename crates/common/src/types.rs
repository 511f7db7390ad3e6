use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// One OHLCV record. `timestamp` is the bar's open time.
///
/// Prices and volume may be NaN when a persisted cell could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn is_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Ordered bar history for one (instrument, timeframe) pair.
///
/// Always ascending by timestamp with no duplicate timestamps. Gaps are
/// tolerated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    bars: Vec<Bar>,
}

impl Series {
    /// Build a series from bars in any order. For duplicate timestamps the
    /// bar appearing later in `bars` is kept.
    pub fn new(bars: Vec<Bar>) -> Self {
        Self::empty().merge(bars)
    }

    pub fn empty() -> Self {
        Self { bars: Vec::new() }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Concatenate, drop duplicate timestamps and re-sort.
    /// Incoming bars win over existing bars with the same timestamp.
    pub fn merge(&self, incoming: Vec<Bar>) -> Series {
        let mut by_time: BTreeMap<DateTime<Utc>, Bar> =
            self.bars.iter().map(|b| (b.timestamp, *b)).collect();
        for bar in incoming {
            by_time.insert(bar.timestamp, bar);
        }
        Series {
            bars: by_time.into_values().collect(),
        }
    }
}

/// Supported bar timeframes. Each carries its nominal interval and the
/// number of periods fetched on a cold load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 7] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
    ];

    /// Exchange interval label, also used in artifact file names.
    pub fn label(self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }

    pub fn interval(self) -> Duration {
        match self {
            Timeframe::M1 => Duration::minutes(1),
            Timeframe::M5 => Duration::minutes(5),
            Timeframe::M15 => Duration::minutes(15),
            Timeframe::M30 => Duration::minutes(30),
            Timeframe::H1 => Duration::hours(1),
            Timeframe::H4 => Duration::hours(4),
            Timeframe::D1 => Duration::days(1),
        }
    }

    /// Periods of history requested when no artifact exists yet. Intraday
    /// keys fetch 300 rather than 200 so a fresh trend series already covers
    /// the SMA200 window with room for gaps in the provider's history.
    pub fn lookback_bars(self) -> i32 {
        match self {
            Timeframe::D1 => 500,
            _ => 300,
        }
    }

    /// Span covered by the cold-load lookback window.
    pub fn lookback(self) -> Duration {
        self.interval() * self.lookback_bars()
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Timeframe {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::ALL
            .into_iter()
            .find(|tf| tf.label() == s)
            .ok_or_else(|| Error::Config(format!("unsupported timeframe '{s}'")))
    }
}

/// Coarse market regime derived from the trend timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Uptrend,
    Downtrend,
    Sideways,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Uptrend => write!(f, "uptrend"),
            Trend::Downtrend => write!(f, "downtrend"),
            Trend::Sideways => write!(f, "sideways"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// Discrete single-bar candlestick label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandlePattern {
    Doji,
    BullishEngulfing,
    BearishEngulfing,
    Hammer,
    ShootingStar,
    NoPattern,
}

impl fmt::Display for CandlePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandlePattern::Doji => write!(f, "Doji"),
            CandlePattern::BullishEngulfing => write!(f, "Bullish Engulfing"),
            CandlePattern::BearishEngulfing => write!(f, "Bearish Engulfing"),
            CandlePattern::Hammer => write!(f, "Hammer"),
            CandlePattern::ShootingStar => write!(f, "Shooting Star"),
            CandlePattern::NoPattern => write!(f, "No Pattern"),
        }
    }
}

/// An indicator that can cast a directional vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteSource {
    Sma,
    Rsi,
    Macd,
    Bollinger,
    Stochastic,
    Obv,
    Mfi,
    Candlestick(CandlePattern),
}

impl fmt::Display for VoteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteSource::Sma => write!(f, "Moving Averages (SMA)"),
            VoteSource::Rsi => write!(f, "Relative Strength Index (RSI)"),
            VoteSource::Macd => write!(f, "MACD"),
            VoteSource::Bollinger => write!(f, "Bollinger Bands"),
            VoteSource::Stochastic => write!(f, "Stochastic"),
            VoteSource::Obv => write!(f, "On-Balance Volume (OBV)"),
            VoteSource::Mfi => write!(f, "Money Flow Index (MFI)"),
            VoteSource::Candlestick(p) => write!(f, "Candlestick Pattern ({p})"),
        }
    }
}

/// Advisory signal emitted by the voting engine. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub instrument: String,
    pub timeframe: Timeframe,
    pub direction: Direction,
    /// Contributing indicators in evaluation order.
    pub indicators: Vec<VoteSource>,
}

impl Signal {
    pub fn votes(&self) -> usize {
        self.indicators.len()
    }

    /// Indicator display names joined for the message body.
    pub fn indicator_list(&self) -> String {
        self.indicators
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Text delivered to subscribers.
    pub fn message(&self) -> String {
        let icon = match self.direction {
            Direction::Long => "📈",
            Direction::Short => "📉",
        };
        format!(
            "🔔 Signal for {instrument} on {timeframe}:\n\
             {icon} {direction} signal for {instrument} on {timeframe}! {votes} indicators agree.\n\
             Indicators: {list}",
            instrument = self.instrument,
            timeframe = self.timeframe,
            direction = self.direction,
            votes = self.votes(),
            list = self.indicator_list(),
        )
    }
}
