use tracing::info;

use common::{CandlePattern, Direction, Signal, Timeframe, Trend, VoteSource};

use crate::indicators::{crossover, Crossover};
use crate::pipeline::EnrichedRow;

/// Minimum agreeing indicators for a signal.
pub const QUORUM: usize = 3;
/// ADX below this marks a non-trending market; nothing is emitted.
pub const ADX_THRESHOLD: f64 = 25.0;

pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const STOCH_OVERSOLD: f64 = 20.0;
pub const STOCH_OVERBOUGHT: f64 = 80.0;
pub const MFI_OVERSOLD: f64 = 20.0;
pub const MFI_OVERBOUGHT: f64 = 80.0;

/// Indicators voting each way, in evaluation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Votes {
    pub buy: Vec<VoteSource>,
    pub sell: Vec<VoteSource>,
}

impl Votes {
    fn cast(&mut self, source: VoteSource, direction: Option<Direction>) {
        match direction {
            Some(Direction::Long) => self.buy.push(source),
            Some(Direction::Short) => self.sell.push(source),
            None => {}
        }
    }
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Trend could not be determined.
    NoTrend,
    /// ADX below threshold or undefined.
    WeakTrend { adx: Option<f64> },
    /// Trend is sideways; neither direction is accepted.
    Sideways,
    /// Trend-aligned votes did not reach quorum.
    BelowQuorum { direction: Direction, votes: usize },
    Emit(Signal),
}

impl Decision {
    pub fn into_signal(self) -> Option<Signal> {
        match self {
            Decision::Emit(signal) => Some(signal),
            _ => None,
        }
    }
}

fn threshold_vote(value: Option<f64>, oversold: f64, overbought: f64) -> Option<Direction> {
    match value? {
        v if v < oversold => Some(Direction::Long),
        v if v > overbought => Some(Direction::Short),
        _ => None,
    }
}

fn cross_vote(cross: Crossover) -> Option<Direction> {
    match cross {
        Crossover::Bullish => Some(Direction::Long),
        Crossover::Bearish => Some(Direction::Short),
        Crossover::Neutral => None,
    }
}

/// Apply every per-indicator rule to the previous and latest rows.
///
/// Each indicator votes at most once, except a doji, which lands in both
/// lists; the trend gate later keeps only one side.
pub fn tally(prev: &EnrichedRow, latest: &EnrichedRow) -> Votes {
    let mut votes = Votes::default();
    let close = latest.bar.close;

    votes.cast(
        VoteSource::Sma,
        cross_vote(crossover(prev.sma_fast, prev.sma_slow, latest.sma_fast, latest.sma_slow)),
    );
    votes.cast(
        VoteSource::Rsi,
        threshold_vote(latest.rsi, RSI_OVERSOLD, RSI_OVERBOUGHT),
    );
    votes.cast(
        VoteSource::Macd,
        cross_vote(crossover(prev.macd, prev.macd_signal, latest.macd, latest.macd_signal)),
    );

    let bollinger = if latest.bb_upper.is_some_and(|upper| close > upper) {
        Some(Direction::Long)
    } else if latest.bb_lower.is_some_and(|lower| close < lower) {
        Some(Direction::Short)
    } else {
        None
    };
    votes.cast(VoteSource::Bollinger, bollinger);

    votes.cast(
        VoteSource::Stochastic,
        threshold_vote(latest.stoch_k, STOCH_OVERSOLD, STOCH_OVERBOUGHT),
    );

    let obv = match (prev.obv, latest.obv) {
        (Some(p), Some(l)) if l > p => Some(Direction::Long),
        (Some(p), Some(l)) if l < p => Some(Direction::Short),
        _ => None,
    };
    votes.cast(VoteSource::Obv, obv);

    votes.cast(
        VoteSource::Mfi,
        threshold_vote(latest.mfi, MFI_OVERSOLD, MFI_OVERBOUGHT),
    );

    let candle = VoteSource::Candlestick(latest.pattern);
    match latest.pattern {
        CandlePattern::Doji => {
            votes.cast(candle, Some(Direction::Long));
            votes.cast(candle, Some(Direction::Short));
        }
        CandlePattern::BullishEngulfing | CandlePattern::Hammer => {
            votes.cast(candle, Some(Direction::Long))
        }
        CandlePattern::BearishEngulfing | CandlePattern::ShootingStar => {
            votes.cast(candle, Some(Direction::Short))
        }
        CandlePattern::NoPattern => {}
    }

    votes
}

/// Decide whether the latest row produces a trend-aligned signal.
///
/// Gates, in order: trend known, ADX at or above threshold, trend not
/// sideways, quorum reached in the trend's direction. Opposite-direction
/// votes never produce a signal.
pub fn evaluate(
    instrument: &str,
    timeframe: Timeframe,
    prev: &EnrichedRow,
    latest: &EnrichedRow,
    trend: Option<Trend>,
) -> Decision {
    let Some(trend) = trend else {
        return Decision::NoTrend;
    };

    info!(
        %instrument,
        %timeframe,
        sma_fast = ?latest.sma_fast,
        sma_slow = ?latest.sma_slow,
        rsi = ?latest.rsi,
        macd = ?latest.macd,
        macd_signal = ?latest.macd_signal,
        obv = ?latest.obv,
        mfi = ?latest.mfi,
        pattern = %latest.pattern,
        "Checking signals"
    );

    match latest.adx {
        Some(adx) if adx >= ADX_THRESHOLD => {}
        adx => {
            info!(%instrument, %timeframe, ?adx, "Trend too weak (ADX < 25), no signals");
            return Decision::WeakTrend { adx };
        }
    }

    let direction = match trend {
        Trend::Uptrend => Direction::Long,
        Trend::Downtrend => Direction::Short,
        Trend::Sideways => {
            info!(%instrument, %timeframe, "Sideways trend, no signals");
            return Decision::Sideways;
        }
    };

    let votes = tally(prev, latest);
    let aligned = match direction {
        Direction::Long => votes.buy,
        Direction::Short => votes.sell,
    };

    if aligned.len() < QUORUM {
        info!(%instrument, %timeframe, %direction, votes = aligned.len(), "Quorum not reached");
        return Decision::BelowQuorum {
            direction,
            votes: aligned.len(),
        };
    }

    let signal = Signal {
        instrument: instrument.to_string(),
        timeframe,
        direction,
        indicators: aligned,
    };
    info!(
        %instrument,
        %timeframe,
        %direction,
        indicators = %signal.indicator_list(),
        "Signal generated"
    );
    Decision::Emit(signal)
}
