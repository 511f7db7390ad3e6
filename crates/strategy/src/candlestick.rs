use common::{Bar, CandlePattern};

/// Body below this fraction of the combined shadows is a doji.
pub const DOJI_BODY_RATIO: f64 = 0.1;
/// Multiplier used by the engulfing, hammer and shooting-star rules.
pub const DOMINANCE_RATIO: f64 = 2.0;

/// Classify a single bar. Rules are checked in a fixed order and the first
/// match wins; a bar with any NaN price matches nothing.
pub fn classify(bar: &Bar) -> CandlePattern {
    if [bar.open, bar.high, bar.low, bar.close].iter().any(|v| v.is_nan()) {
        return CandlePattern::NoPattern;
    }
    let body = (bar.close - bar.open).abs();
    let upper_shadow = bar.high - bar.close.max(bar.open);
    let lower_shadow = bar.close.min(bar.open) - bar.low;
    let shadows = upper_shadow + lower_shadow;
    let bullish = bar.close > bar.open;
    let bearish = bar.close < bar.open;

    if body < shadows * DOJI_BODY_RATIO {
        CandlePattern::Doji
    } else if body > shadows * DOMINANCE_RATIO && bullish {
        CandlePattern::BullishEngulfing
    } else if body > shadows * DOMINANCE_RATIO && bearish {
        CandlePattern::BearishEngulfing
    } else if lower_shadow > body * DOMINANCE_RATIO && bullish {
        CandlePattern::Hammer
    } else if upper_shadow > body * DOMINANCE_RATIO && bearish {
        CandlePattern::ShootingStar
    } else {
        CandlePattern::NoPattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ohlc(open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: Utc.timestamp_opt(0, 0).unwrap(),
            open,
            high,
            low,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn flat_bar_is_no_pattern_not_doji() {
        assert_eq!(classify(&ohlc(10.0, 10.0, 10.0, 10.0)), CandlePattern::NoPattern);
    }

    #[test]
    fn doji_boundary_is_strict() {
        // shadows 10, body exactly 1 = 0.1 * 10 → not a doji
        assert_ne!(classify(&ohlc(100.0, 106.0, 95.0, 101.0)), CandlePattern::Doji);
        // body 0.5 < 1 → doji
        assert_eq!(classify(&ohlc(100.0, 105.5, 94.5, 100.5)), CandlePattern::Doji);
    }

    #[test]
    fn full_body_bars_are_engulfing() {
        assert_eq!(classify(&ohlc(10.0, 20.0, 10.0, 20.0)), CandlePattern::BullishEngulfing);
        assert_eq!(classify(&ohlc(20.0, 20.0, 10.0, 10.0)), CandlePattern::BearishEngulfing);
    }

    #[test]
    fn engulfing_boundary_is_strict() {
        // body 4, shadows 2 → 4 > 4 is false; lower shadow 1 < 8 → no pattern
        assert_eq!(classify(&ohlc(10.0, 15.0, 9.0, 14.0)), CandlePattern::NoPattern);
        // body 4.01 > 4
        assert_eq!(classify(&ohlc(10.0, 15.01, 9.0, 14.01)), CandlePattern::BullishEngulfing);
    }

    #[test]
    fn long_lower_shadow_on_up_bar_is_hammer() {
        // body 1, lower 3, upper 0.5: 1 < 0.35 no, 1 > 7 no, lower 3 > 2
        assert_eq!(classify(&ohlc(10.0, 11.5, 7.0, 11.0)), CandlePattern::Hammer);
    }

    #[test]
    fn long_upper_shadow_on_down_bar_is_shooting_star() {
        assert_eq!(classify(&ohlc(11.0, 14.0, 9.5, 10.0)), CandlePattern::ShootingStar);
    }

    #[test]
    fn long_lower_shadow_on_down_bar_is_no_pattern() {
        assert_eq!(classify(&ohlc(11.0, 11.5, 7.0, 10.0)), CandlePattern::NoPattern);
    }

    #[test]
    fn nan_prices_match_nothing() {
        assert_eq!(classify(&ohlc(f64::NAN, 11.0, 9.0, 10.0)), CandlePattern::NoPattern);
    }
}
