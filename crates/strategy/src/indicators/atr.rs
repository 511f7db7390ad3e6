use common::Bar;

use super::moving_average::wilder;

/// True range per bar. Undefined for the first bar (no previous close) and
/// wherever a price involved is not finite.
pub fn true_range(bars: &[Bar]) -> Vec<Option<f64>> {
    let mut out = vec![None; bars.len()];
    for (i, pair) in bars.windows(2).enumerate() {
        let (prev, bar) = (&pair[0], &pair[1]);
        let tr = (bar.high - bar.low)
            .max((bar.high - prev.close).abs())
            .max((bar.low - prev.close).abs());
        out[i + 1] = [bar.high, bar.low, prev.close]
            .iter()
            .all(|v| v.is_finite())
            .then_some(tr);
    }
    out
}

/// Average True Range with Wilder smoothing.
#[derive(Debug, Clone)]
pub struct AverageTrueRange {
    pub period: usize,
}

impl AverageTrueRange {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self { period }
    }

    pub fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        wilder(&true_range(bars), self.period)
    }
}
