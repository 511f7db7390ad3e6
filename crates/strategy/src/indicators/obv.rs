use common::Bar;

/// On-Balance Volume: running total adding volume unless the close fell,
/// in which case volume is subtracted. The first bar contributes its volume.
/// Non-finite contributions are skipped.
pub fn on_balance_volume(bars: &[Bar]) -> Vec<Option<f64>> {
    let mut total = 0.0;
    let mut prev_close: Option<f64> = None;
    bars.iter()
        .map(|bar| {
            let signed = match prev_close {
                Some(prev) if bar.close < prev => -bar.volume,
                _ => bar.volume,
            };
            if signed.is_finite() {
                total += signed;
            }
            prev_close = Some(bar.close);
            Some(total)
        })
        .collect()
}
