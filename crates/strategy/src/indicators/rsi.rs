/// RSI (Relative Strength Index) indicator.
///
/// Uses Wilder's smoothed moving average (same as TradingView / standard RSI).
/// Values are undefined for the first `period` rows.
#[derive(Debug, Clone)]
pub struct RsiIndicator {
    pub period: usize,
}

impl RsiIndicator {
    pub fn new(period: usize) -> Self {
        assert!(period >= 2, "RSI period must be >= 2");
        Self { period }
    }

    /// Compute RSI for every row of `closes` (oldest first).
    pub fn compute(&self, closes: &[f64]) -> Vec<Option<f64>> {
        let n = self.period;
        let mut out = vec![None; closes.len()];
        if closes.len() < n + 1 {
            return out;
        }

        // First average gain/loss over the initial `period` changes
        let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
        let initial = &changes[..n];

        let mut avg_gain = initial.iter().filter(|&&c| c > 0.0).sum::<f64>() / n as f64;
        let mut avg_loss =
            initial.iter().filter(|&&c| c < 0.0).map(|c| c.abs()).sum::<f64>() / n as f64;
        out[n] = Some(rsi_from(avg_gain, avg_loss));

        // Wilder smoothing over remaining changes
        for (i, &change) in changes.iter().enumerate().skip(n) {
            let gain = if change > 0.0 { change } else { 0.0 };
            let loss = if change < 0.0 { change.abs() } else { 0.0 };
            avg_gain = (avg_gain * (n - 1) as f64 + gain) / n as f64;
            avg_loss = (avg_loss * (n - 1) as f64 + loss) / n as f64;
            out[i + 1] = Some(rsi_from(avg_gain, avg_loss));
        }
        out
    }
}

fn rsi_from(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_undefined_when_insufficient_data() {
        let rsi = RsiIndicator::new(14);
        // Need at least period+1 = 15 values
        let prices = vec![100.0; 14];
        assert!(rsi.compute(&prices).iter().all(Option::is_none));
    }

    #[test]
    fn rsi_first_defined_at_period() {
        let rsi = RsiIndicator::new(14);
        let prices: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let out = rsi.compute(&prices);
        assert!(out[13].is_none());
        assert!(out[14].is_some());
    }

    #[test]
    fn rsi_all_gains_returns_100() {
        let rsi = RsiIndicator::new(3);
        // Strictly increasing prices → RSI = 100
        let prices = vec![10.0, 11.0, 12.0, 13.0, 14.0];
        let value = rsi.compute(&prices)[4].unwrap();
        assert!((value - 100.0).abs() < 1e-6, "Expected ~100, got {value}");
    }

    #[test]
    fn rsi_all_losses_returns_0() {
        let rsi = RsiIndicator::new(3);
        // Strictly decreasing prices → RSI = 0
        let prices = vec![14.0, 13.0, 12.0, 11.0, 10.0];
        let value = rsi.compute(&prices)[4].unwrap();
        assert!((value - 0.0).abs() < 1e-6, "Expected ~0, got {value}");
    }

    #[test]
    fn rsi_known_series_stays_in_range() {
        // Prices sourced from Investopedia RSI example (rounded)
        let rsi = RsiIndicator::new(14);
        let prices = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.15, 43.61, 44.33, 44.83, 45.10,
            45.15, 44.34, 44.09, 44.50, 45.20,
        ];
        for v in rsi.compute(&prices).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&v), "RSI out of range: {v}");
        }
    }

    #[test]
    fn rsi_after_single_rebound_uses_wilder_weights() {
        let rsi = RsiIndicator::new(2);
        // changes: -1, -1 → avg_loss 1; then +3 → gain 1.5, loss 0.5 → RS 3
        let value = rsi.compute(&[10.0, 9.0, 8.0, 11.0])[3].unwrap();
        assert!((value - 75.0).abs() < 1e-9, "got {value}");
    }
}
