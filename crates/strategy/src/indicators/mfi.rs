use common::Bar;

/// Money Flow Index: volume-weighted RSI over typical price, in [0, 100].
#[derive(Debug, Clone)]
pub struct MoneyFlowIndex {
    pub period: usize,
}

impl MoneyFlowIndex {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "MFI period must be >= 1");
        Self { period }
    }

    /// Defined from row `period`. A window with no money flow at all is
    /// undefined; one with only positive flow is 100.
    pub fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let typical: Vec<f64> = bars.iter().map(|b| (b.high + b.low + b.close) / 3.0).collect();

        // (positive, negative) raw money flow per row, none for row 0 or an
        // unparseable bar
        let mut flows = vec![(0.0, 0.0); bars.len()];
        for i in 1..bars.len() {
            let raw = typical[i] * bars[i].volume;
            if !(raw.is_finite() && typical[i - 1].is_finite()) {
                continue;
            }
            if typical[i] > typical[i - 1] {
                flows[i] = (raw, 0.0);
            } else if typical[i] < typical[i - 1] {
                flows[i] = (0.0, raw);
            }
        }

        let mut out = vec![None; bars.len()];
        for end in (self.period + 1)..=bars.len() {
            let (positive, negative) = flows[end - self.period..end]
                .iter()
                .fold((0.0_f64, 0.0_f64), |(p, n), &(pos, neg)| (p + pos, n + neg));
            out[end - 1] = if negative == 0.0 {
                (positive > 0.0).then_some(100.0)
            } else {
                Some(100.0 - 100.0 / (1.0 + positive / negative))
            };
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bar(price: f64, volume: f64) -> Bar {
        Bar {
            timestamp: Utc.timestamp_opt(0, 0).unwrap(),
            open: price,
            high: price,
            low: price,
            close: price,
            volume,
        }
    }

    #[test]
    fn only_rising_flow_is_100_only_falling_is_0() {
        let mfi = MoneyFlowIndex::new(3);
        let up: Vec<Bar> = (0..5).map(|i| bar(10.0 + i as f64, 1.0)).collect();
        let out = mfi.compute(&up);
        assert!(out[2].is_none());
        assert_eq!(out[3], Some(100.0));

        let down: Vec<Bar> = (0..5).map(|i| bar(10.0 - i as f64, 1.0)).collect();
        assert_eq!(mfi.compute(&down)[4], Some(0.0));
    }

    #[test]
    fn balanced_flow_is_50() {
        let mfi = MoneyFlowIndex::new(2);
        // +flow 12*1, -flow 6*2
        let bars = [bar(10.0, 1.0), bar(12.0, 1.0), bar(6.0, 2.0)];
        assert_eq!(mfi.compute(&bars)[2], Some(50.0));
    }

    #[test]
    fn no_flow_is_undefined() {
        let mfi = MoneyFlowIndex::new(3);
        let flat: Vec<Bar> = (0..6).map(|_| bar(10.0, 1.0)).collect();
        assert!(mfi.compute(&flat).iter().all(Option::is_none));
    }
}
