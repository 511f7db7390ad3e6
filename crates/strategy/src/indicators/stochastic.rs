use common::Bar;

use super::moving_average::{finite, sma_defined};

/// Stochastic oscillator. %K over `period` bars, %D = SMA(%K, `smooth`).
#[derive(Debug, Clone)]
pub struct StochasticOscillator {
    pub period: usize,
    pub smooth: usize,
}

#[derive(Debug, Clone, Default)]
pub struct StochasticSeries {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
}

impl StochasticOscillator {
    pub fn new(period: usize, smooth: usize) -> Self {
        assert!(period >= 1 && smooth >= 1, "Stochastic windows must be >= 1");
        Self { period, smooth }
    }

    /// %K is undefined where the window's high equals its low or the close
    /// is not finite.
    pub fn compute(&self, bars: &[Bar]) -> StochasticSeries {
        let mut k = vec![None; bars.len()];
        for end in self.period..=bars.len() {
            let window = &bars[end - self.period..end];
            let highest = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
            let lowest = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
            let range = highest - lowest;
            if range > 0.0 {
                k[end - 1] = finite(100.0 * (bars[end - 1].close - lowest) / range);
            }
        }
        let d = sma_defined(&k, self.smooth);
        StochasticSeries { k, d }
    }
}
