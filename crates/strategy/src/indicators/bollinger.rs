/// Bollinger Bands: rolling mean ± `width` population standard deviations.
/// A window holding a non-finite close is undefined.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    pub period: usize,
    pub width: f64,
}

#[derive(Debug, Clone, Default)]
pub struct BandSeries {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

impl BollingerBands {
    pub fn new(period: usize, width: f64) -> Self {
        assert!(period >= 2, "Bollinger period must be >= 2");
        Self { period, width }
    }

    pub fn compute(&self, closes: &[f64]) -> BandSeries {
        let mut bands = BandSeries {
            upper: vec![None; closes.len()],
            middle: vec![None; closes.len()],
            lower: vec![None; closes.len()],
        };
        for end in self.period..=closes.len() {
            let window = &closes[end - self.period..end];
            if !window.iter().all(|c| c.is_finite()) {
                continue;
            }
            let mean = window.iter().sum::<f64>() / self.period as f64;
            let variance =
                window.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / self.period as f64;
            let offset = self.width * variance.sqrt();

            let i = end - 1;
            bands.upper[i] = Some(mean + offset);
            bands.middle[i] = Some(mean);
            bands.lower[i] = Some(mean - offset);
        }
        bands
    }
}
