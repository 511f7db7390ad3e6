pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod macd;
pub mod mfi;
pub mod moving_average;
pub mod obv;
pub mod rsi;
pub mod stochastic;

pub use adx::DirectionalIndex;
pub use atr::AverageTrueRange;
pub use bollinger::BollingerBands;
pub use macd::MacdIndicator;
pub use mfi::MoneyFlowIndex;
pub use obv::on_balance_volume;
pub use rsi::RsiIndicator;
pub use stochastic::StochasticOscillator;

/// Relationship change between two lines across consecutive rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossover {
    Bullish, // line crossed to at/above the reference
    Bearish, // line crossed to at/below the reference
    Neutral, // no crossover on the latest row, or a value is undefined
}

/// Gaps smaller than this between a line and its reference count as equal.
pub const CROSS_EPSILON: f64 = 1e-9;

/// Classify `line` against `reference` between the previous and latest rows.
pub fn crossover(
    prev_line: Option<f64>,
    prev_ref: Option<f64>,
    line: Option<f64>,
    reference: Option<f64>,
) -> Crossover {
    let (Some(pl), Some(pr), Some(l), Some(r)) = (prev_line, prev_ref, line, reference) else {
        return Crossover::Neutral;
    };
    let gap = |a: f64, b: f64| if (a - b).abs() < CROSS_EPSILON { 0.0 } else { a - b };
    let (before, after) = (gap(pl, pr), gap(l, r));
    if before < 0.0 && after >= 0.0 {
        Crossover::Bullish
    } else if before > 0.0 && after <= 0.0 {
        Crossover::Bearish
    } else {
        Crossover::Neutral
    }
}
