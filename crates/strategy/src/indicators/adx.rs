use common::Bar;

use super::atr::true_range;
use super::moving_average::wilder;

/// Average Directional Index (Wilder). Trend strength in [0, 100],
/// defined from row `2 * period - 1`.
#[derive(Debug, Clone)]
pub struct DirectionalIndex {
    pub period: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DirectionalSeries {
    pub adx: Vec<Option<f64>>,
    pub plus_di: Vec<Option<f64>>,
    pub minus_di: Vec<Option<f64>>,
}

impl DirectionalIndex {
    pub fn new(period: usize) -> Self {
        assert!(period >= 2, "ADX period must be >= 2");
        Self { period }
    }

    pub fn compute(&self, bars: &[Bar]) -> DirectionalSeries {
        let len = bars.len();
        let mut plus_dm = vec![None; len];
        let mut minus_dm = vec![None; len];
        for (i, pair) in bars.windows(2).enumerate() {
            let up = pair[1].high - pair[0].high;
            let down = pair[0].low - pair[1].low;
            if !(up.is_finite() && down.is_finite()) {
                continue;
            }
            plus_dm[i + 1] = Some(if up > down && up > 0.0 { up } else { 0.0 });
            minus_dm[i + 1] = Some(if down > up && down > 0.0 { down } else { 0.0 });
        }

        let tr = wilder(&true_range(bars), self.period);
        let plus = wilder(&plus_dm, self.period);
        let minus = wilder(&minus_dm, self.period);

        let mut plus_di = vec![None; len];
        let mut minus_di = vec![None; len];
        let mut dx = vec![None; len];
        for i in 0..len {
            let (Some(tr), Some(p), Some(m)) = (tr[i], plus[i], minus[i]) else {
                continue;
            };
            if tr <= 0.0 {
                continue;
            }
            let pdi = 100.0 * p / tr;
            let mdi = 100.0 * m / tr;
            let sum = pdi + mdi;
            plus_di[i] = Some(pdi);
            minus_di[i] = Some(mdi);
            dx[i] = Some(if sum > 0.0 { 100.0 * (pdi - mdi).abs() / sum } else { 0.0 });
        }

        DirectionalSeries {
            adx: wilder(&dx, self.period),
            plus_di,
            minus_di,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    /// Full-body bearish bars stepping down by one each bar.
    fn staircase_down(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let close = 1000.0 - i as f64;
                Bar {
                    timestamp: Utc.timestamp_opt(i as i64 * 60, 0).unwrap(),
                    open: close + 1.0,
                    high: close + 1.0,
                    low: close,
                    close,
                    volume: 1.0,
                }
            })
            .collect()
    }

    #[test]
    fn adx_defined_from_twice_the_period() {
        let out = DirectionalIndex::new(14).compute(&staircase_down(40));
        assert!(out.adx[26].is_none());
        assert!(out.adx[27].is_some());
    }

    #[test]
    fn one_sided_movement_saturates_adx() {
        let out = DirectionalIndex::new(14).compute(&staircase_down(60));
        let adx = out.adx[59].unwrap();
        assert!((adx - 100.0).abs() < 1e-9, "got {adx}");
        assert_eq!(out.plus_di[59], Some(0.0));
        assert!((out.minus_di[59].unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn unparseable_high_does_not_poison_later_rows() {
        let mut bars = staircase_down(120);
        bars[60].high = f64::NAN;
        let out = DirectionalIndex::new(14).compute(&bars);
        assert!(out.plus_di[60].is_none());
        let adx = out.adx[119].unwrap();
        assert!((adx - 100.0).abs() < 1e-9, "got {adx}");
    }

    #[test]
    fn flat_bars_leave_adx_undefined() {
        let bars: Vec<Bar> = staircase_down(40)
            .into_iter()
            .map(|b| Bar { open: 5.0, high: 5.0, low: 5.0, close: 5.0, ..b })
            .collect();
        let out = DirectionalIndex::new(14).compute(&bars);
        assert!(out.adx.iter().all(Option::is_none));
    }
}
