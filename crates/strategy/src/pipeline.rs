//! Batch indicator computation over a whole series.
//!
//! Every refresh recomputes the full table; series are bounded to a few
//! hundred bars so there is no incremental state to maintain.

use common::{Bar, CandlePattern, Error, Result, Series};

use crate::candlestick;
use crate::indicators::moving_average::{ema, sma};
use crate::indicators::{
    on_balance_volume, AverageTrueRange, BollingerBands, DirectionalIndex, MacdIndicator,
    MoneyFlowIndex, RsiIndicator, StochasticOscillator,
};

pub const SMA_FAST: usize = 5;
pub const SMA_SLOW: usize = 10;
pub const EMA_PERIOD: usize = 20;
pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_WIDTH: f64 = 2.0;
pub const STOCH_PERIOD: usize = 14;
pub const STOCH_SMOOTH: usize = 3;
pub const ADX_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;
pub const MFI_PERIOD: usize = 14;

/// Minimum rows needed to compare a latest bar with its predecessor.
pub const MIN_ROWS: usize = 2;

/// A bar plus every indicator value for that row. `None` means the
/// indicator's lookback is not yet satisfied (or the value is undefined,
/// e.g. a stochastic over a flat window).
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRow {
    pub bar: Bar,
    pub sma_fast: Option<f64>,
    pub sma_slow: Option<f64>,
    pub ema: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub adx: Option<f64>,
    pub atr: Option<f64>,
    pub obv: Option<f64>,
    pub mfi: Option<f64>,
    pub pattern: CandlePattern,
}

impl EnrichedRow {
    /// An enriched row with every indicator undefined.
    pub fn bare(bar: Bar) -> Self {
        Self {
            pattern: candlestick::classify(&bar),
            bar,
            sma_fast: None,
            sma_slow: None,
            ema: None,
            rsi: None,
            macd: None,
            macd_signal: None,
            bb_upper: None,
            bb_middle: None,
            bb_lower: None,
            stoch_k: None,
            stoch_d: None,
            adx: None,
            atr: None,
            obv: None,
            mfi: None,
        }
    }

    /// Named numeric indicator values, in column order.
    pub fn values(&self) -> [(&'static str, Option<f64>); 15] {
        [
            ("SMA5", self.sma_fast),
            ("SMA10", self.sma_slow),
            ("EMA20", self.ema),
            ("RSI", self.rsi),
            ("MACD", self.macd),
            ("MACD_signal", self.macd_signal),
            ("Bollinger_High", self.bb_upper),
            ("Bollinger_Mid", self.bb_middle),
            ("Bollinger_Low", self.bb_lower),
            ("Stochastic", self.stoch_k),
            ("Stochastic_D", self.stoch_d),
            ("ADX", self.adx),
            ("ATR", self.atr),
            ("OBV", self.obv),
            ("MFI", self.mfi),
        ]
    }

    /// Fails on the first NaN/inf among the row's OHLC prices or defined
    /// indicator values.
    pub fn ensure_finite(&self) -> Result<()> {
        let prices = [
            ("open", Some(self.bar.open)),
            ("high", Some(self.bar.high)),
            ("low", Some(self.bar.low)),
            ("close", Some(self.bar.close)),
        ];
        for (name, value) in prices.into_iter().chain(self.values()) {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(Error::IndicatorCompute(format!(
                        "{name} is {v} at {}",
                        self.bar.timestamp
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Column-oriented indicator values aligned with the input bars.
#[derive(Debug, Clone, Default)]
pub struct IndicatorTable {
    bars: Vec<Bar>,
    sma_fast: Vec<Option<f64>>,
    sma_slow: Vec<Option<f64>>,
    ema: Vec<Option<f64>>,
    rsi: Vec<Option<f64>>,
    macd: Vec<Option<f64>>,
    macd_signal: Vec<Option<f64>>,
    bb_upper: Vec<Option<f64>>,
    bb_middle: Vec<Option<f64>>,
    bb_lower: Vec<Option<f64>>,
    stoch_k: Vec<Option<f64>>,
    stoch_d: Vec<Option<f64>>,
    adx: Vec<Option<f64>>,
    atr: Vec<Option<f64>>,
    obv: Vec<Option<f64>>,
    mfi: Vec<Option<f64>>,
    patterns: Vec<CandlePattern>,
}

impl IndicatorTable {
    /// Compute every indicator over the whole series in one pass.
    pub fn compute(series: &Series) -> Self {
        let bars = series.bars().to_vec();
        let closes = series.closes();

        let macd = MacdIndicator::new(MACD_FAST, MACD_SLOW, MACD_SIGNAL).compute(&closes);
        let bands = BollingerBands::new(BOLLINGER_PERIOD, BOLLINGER_WIDTH).compute(&closes);
        let stoch = StochasticOscillator::new(STOCH_PERIOD, STOCH_SMOOTH).compute(&bars);
        let directional = DirectionalIndex::new(ADX_PERIOD).compute(&bars);

        Self {
            sma_fast: sma(&closes, SMA_FAST),
            sma_slow: sma(&closes, SMA_SLOW),
            ema: ema(&closes, EMA_PERIOD),
            rsi: RsiIndicator::new(RSI_PERIOD).compute(&closes),
            macd: macd.line,
            macd_signal: macd.signal,
            bb_upper: bands.upper,
            bb_middle: bands.middle,
            bb_lower: bands.lower,
            stoch_k: stoch.k,
            stoch_d: stoch.d,
            adx: directional.adx,
            atr: AverageTrueRange::new(ATR_PERIOD).compute(&bars),
            obv: on_balance_volume(&bars),
            mfi: MoneyFlowIndex::new(MFI_PERIOD).compute(&bars),
            patterns: bars.iter().map(candlestick::classify).collect(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn row(&self, i: usize) -> Option<EnrichedRow> {
        Some(EnrichedRow {
            bar: *self.bars.get(i)?,
            sma_fast: self.sma_fast[i],
            sma_slow: self.sma_slow[i],
            ema: self.ema[i],
            rsi: self.rsi[i],
            macd: self.macd[i],
            macd_signal: self.macd_signal[i],
            bb_upper: self.bb_upper[i],
            bb_middle: self.bb_middle[i],
            bb_lower: self.bb_lower[i],
            stoch_k: self.stoch_k[i],
            stoch_d: self.stoch_d[i],
            adx: self.adx[i],
            atr: self.atr[i],
            obv: self.obv[i],
            mfi: self.mfi[i],
            pattern: self.patterns[i],
        })
    }

    /// `(previous, latest)` rows, if the table has at least two rows.
    pub fn latest_pair(&self) -> Option<(EnrichedRow, EnrichedRow)> {
        let n = self.len();
        if n < MIN_ROWS {
            return None;
        }
        Some((self.row(n - 2)?, self.row(n - 1)?))
    }
}

/// Enrich `series` and return the two rows the voting engine compares.
///
/// Fails with `InsufficientData` below two bars and with `IndicatorCompute`
/// when either row carries a non-finite value.
pub fn analyze(series: &Series) -> Result<(EnrichedRow, EnrichedRow)> {
    if series.len() < MIN_ROWS {
        return Err(Error::InsufficientData {
            needed: MIN_ROWS,
            available: series.len(),
        });
    }
    let table = IndicatorTable::compute(series);
    let (previous, latest) = table.latest_pair().ok_or(Error::InsufficientData {
        needed: MIN_ROWS,
        available: table.len(),
    })?;
    previous.ensure_finite()?;
    latest.ensure_finite()?;
    Ok((previous, latest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn rising(n: usize) -> Series {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Series::new(
            (0..n)
                .map(|i| {
                    let close = 100.0 + i as f64;
                    Bar {
                        timestamp: t0 + Duration::minutes(15 * i as i64),
                        open: close - 0.5,
                        high: close + 0.25,
                        low: close - 0.75,
                        close,
                        volume: 10.0,
                    }
                })
                .collect(),
        )
    }

    #[test]
    fn table_is_aligned_with_bars() {
        let series = rising(60);
        let table = IndicatorTable::compute(&series);
        assert_eq!(table.len(), 60);
        let row = table.row(59).unwrap();
        assert_eq!(row.bar, series.bars()[59]);
        assert!(table.row(60).is_none());
    }

    #[test]
    fn early_rows_are_undefined_not_errors() {
        let table = IndicatorTable::compute(&rising(12));
        let row = table.row(11).unwrap();
        assert!(row.sma_slow.is_some());
        assert!(row.ema.is_none());
        assert!(row.macd.is_none());
        assert!(row.adx.is_none());
        assert!(row.obv.is_some());
    }

    #[test]
    fn all_indicators_defined_after_warmup() {
        let table = IndicatorTable::compute(&rising(60));
        let row = table.row(59).unwrap();
        for (name, value) in row.values() {
            assert!(value.is_some(), "{name} undefined after warmup");
        }
    }

    #[test]
    fn analyze_rejects_single_bar() {
        let err = analyze(&rising(1)).unwrap_err();
        assert!(matches!(err, Error::InsufficientData { needed: 2, available: 1 }));
    }

    #[test]
    fn analyze_reports_non_finite_latest_row() {
        let mut bars = rising(40).bars().to_vec();
        bars[39].close = f64::NAN;
        let err = analyze(&Series::new(bars)).unwrap_err();
        assert!(matches!(err, Error::IndicatorCompute(_)), "got {err:?}");
    }

    #[test]
    fn unparseable_cells_in_history_do_not_block_analysis() {
        let mut bars = rising(300).bars().to_vec();
        bars[10].close = f64::NAN;
        bars[200].close = f64::NAN;
        bars[200].high = f64::NAN;
        bars[210].volume = f64::NAN;
        let (prev, latest) = analyze(&Series::new(bars)).unwrap();
        for (name, value) in prev.values().into_iter().chain(latest.values()) {
            assert!(value.is_some_and(f64::is_finite), "{name} is {value:?}");
        }
    }

    #[test]
    fn analyze_returns_previous_then_latest() {
        let series = rising(40);
        let (prev, latest) = analyze(&series).unwrap();
        assert_eq!(prev.bar, series.bars()[38]);
        assert_eq!(latest.bar, series.bars()[39]);
    }
}
