use super::moving_average::{ema, ema_defined};

/// MACD (Moving Average Convergence/Divergence) indicator.
///
/// Computes: MACD line = EMA(fast) − EMA(slow), Signal = EMA(macd_line, signal_period).
#[derive(Debug, Clone)]
pub struct MacdIndicator {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

/// Per-row MACD line and signal line.
#[derive(Debug, Clone, Default)]
pub struct MacdSeries {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
}

impl MacdIndicator {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(
            fast < slow,
            "MACD fast period must be less than slow period"
        );
        Self { fast, slow, signal }
    }

    /// The line is defined from row `slow - 1`, the signal line from
    /// row `slow + signal - 2`.
    pub fn compute(&self, closes: &[f64]) -> MacdSeries {
        let fast = ema(closes, self.fast);
        let slow = ema(closes, self.slow);

        let line: Vec<Option<f64>> = fast
            .iter()
            .zip(&slow)
            .map(|(f, s)| Some((*f)? - (*s)?))
            .collect();
        let signal = ema_defined(&line, self.signal);

        MacdSeries { line, signal }
    }
}
