//! Moving-average building blocks shared by the other indicators.
//!
//! All functions return one entry per input value; `None` marks rows where
//! the lookback window is not yet satisfied. Non-finite inputs are treated
//! as undefined.

/// `Some(v)` for a finite value, `None` for NaN or infinity.
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Simple moving average of `period` values ending at each index.
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let defined: Vec<Option<f64>> = values.iter().copied().map(finite).collect();
    sma_defined(&defined, period)
}

/// SMA over a partially undefined series. A window containing an undefined
/// value is undefined.
pub fn sma_defined(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if period == 0 || i + 1 < period {
                return None;
            }
            values[i + 1 - period..=i]
                .iter()
                .copied()
                .sum::<Option<f64>>()
                .map(|sum| sum / period as f64)
        })
        .collect()
}

/// Exponential moving average, `k = 2 / (period + 1)`, seeded with the SMA
/// of the first `period` consecutive defined values.
pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let defined: Vec<Option<f64>> = values.iter().copied().map(finite).collect();
    ema_defined(&defined, period)
}

pub fn ema_defined(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    smooth(values, period, 2.0 / (period as f64 + 1.0))
}

/// Wilder's smoothing (`alpha = 1 / period`), seeded with an SMA.
pub fn wilder(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    smooth(values, period, 1.0 / period as f64)
}

fn smooth(values: &[Option<f64>], period: usize, alpha: f64) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }
    let mut prev: Option<f64> = None;
    let (mut seed_sum, mut seed_len) = (0.0, 0);
    for (i, value) in values.iter().enumerate() {
        match (prev, *value) {
            (Some(p), Some(v)) => {
                let next = v * alpha + p * (1.0 - alpha);
                prev = Some(next);
                out[i] = Some(next);
            }
            // Undefined inputs after the seed leave a hole without resetting state.
            (Some(_), None) => {}
            (None, Some(v)) => {
                seed_sum += v;
                seed_len += 1;
                if seed_len == period {
                    prev = Some(seed_sum / period as f64);
                    out[i] = prev;
                }
            }
            // A hole inside the seed window restarts seeding.
            (None, None) => {
                seed_sum = 0.0;
                seed_len = 0;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_is_undefined_until_window_fills() {
        let out = sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(out, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn sma_defined_skips_windows_with_holes() {
        let out = sma_defined(&[None, Some(2.0), Some(4.0), Some(6.0)], 2);
        assert_eq!(out, vec![None, None, Some(3.0), Some(5.0)]);
    }

    #[test]
    fn ema_seeds_with_sma_then_smooths() {
        let out = ema(&[2.0, 4.0, 6.0, 8.0], 3);
        assert!(out[..2].iter().all(Option::is_none));
        assert_eq!(out[2], Some(4.0));
        // k = 0.5: 8 * 0.5 + 4 * 0.5
        assert_eq!(out[3], Some(6.0));
    }

    #[test]
    fn ema_of_constant_series_is_constant() {
        let out = ema(&[7.0; 30], 9);
        assert!(out[..8].iter().all(Option::is_none));
        for v in &out[8..] {
            let v = v.unwrap();
            assert!((v - 7.0).abs() < 1e-9, "got {v}");
        }
    }

    #[test]
    fn wilder_starts_at_first_defined_value() {
        let out = wilder(&[None, Some(1.0), Some(3.0), Some(5.0)], 2);
        assert_eq!(out[2], Some(2.0));
        assert_eq!(out[3], Some(3.5));
    }

    #[test]
    fn nan_input_leaves_a_hole_and_smoothing_resumes() {
        let mut values = [10.0; 12];
        values[6] = f64::NAN;
        let out = ema(&values, 3);
        assert!(out[6].is_none());
        assert_eq!(out[7], Some(10.0));
        assert_eq!(out[11], Some(10.0));

        let out = sma(&values, 3);
        assert!(out[6..9].iter().all(Option::is_none));
        assert_eq!(out[9], Some(10.0));
    }

    #[test]
    fn hole_inside_seed_window_restarts_seeding() {
        let out = wilder(&[Some(1.0), None, Some(2.0), Some(4.0), Some(6.0)], 2);
        assert!(out[..3].iter().all(Option::is_none));
        assert_eq!(out[3], Some(3.0));
        assert_eq!(out[4], Some(4.5));
    }

    #[test]
    fn too_short_input_yields_all_none() {
        assert!(sma(&[1.0, 2.0], 5).iter().all(Option::is_none));
        assert!(ema(&[1.0, 2.0], 5).iter().all(Option::is_none));
    }
}
