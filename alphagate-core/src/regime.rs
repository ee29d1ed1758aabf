//! Market regime classification from a reference index series.
//!
//! Two axes: trend (close vs 200-day SMA) and annualized 21-day realized
//! volatility. Crash is checked first and overrides trend. With fewer than
//! `MIN_HISTORY` bars the classifier refuses to guess and returns Neutral.

use crate::domain::{Bar, MarketRegime};
use crate::indicators::{Indicator, RealizedVol, Sma};

/// Bars required before the classifier produces a non-Neutral answer.
pub const MIN_HISTORY: usize = 200;
/// Trend SMA period.
pub const TREND_PERIOD: usize = 200;
/// Realized volatility window (returns).
pub const VOL_PERIOD: usize = 21;

/// Annualized vol at or above this is a Crash, regardless of trend.
pub const CRASH_VOL: f64 = 0.40;
/// Above-trend regimes split quiet/volatile at this vol.
pub const BULL_VOL_SPLIT: f64 = 0.15;
/// At-or-below-trend regimes split quiet/volatile at this vol.
pub const BEAR_VOL_SPLIT: f64 = 0.25;

/// Classify the regime as of the final bar.
pub fn classify(bars: &[Bar]) -> MarketRegime {
    classify_series(bars).last().copied().unwrap_or(MarketRegime::Neutral)
}

/// Classify the regime at every bar index.
///
/// Index i uses only bars 0..=i. Warmup indices (and any index where an
/// input is NaN) are Neutral.
pub fn classify_series(bars: &[Bar]) -> Vec<MarketRegime> {
    let n = bars.len();
    if n == 0 {
        return Vec::new();
    }
    let sma = Sma::new(TREND_PERIOD).compute(bars);
    let vol = RealizedVol::new(VOL_PERIOD).compute(bars);

    (0..n)
        .map(|i| {
            if i + 1 < MIN_HISTORY {
                MarketRegime::Neutral
            } else {
                classify_point(bars[i].close, sma[i], vol[i])
            }
        })
        .collect()
}

fn classify_point(close: f64, sma: f64, vol: f64) -> MarketRegime {
    if !close.is_finite() || !sma.is_finite() || !vol.is_finite() {
        return MarketRegime::Neutral;
    }
    if vol >= CRASH_VOL {
        return MarketRegime::Crash;
    }
    if close > sma {
        if vol < BULL_VOL_SPLIT {
            MarketRegime::BullQuiet
        } else {
            MarketRegime::BullVolatile
        }
    } else if vol >= BEAR_VOL_SPLIT {
        MarketRegime::BearVolatile
    } else {
        MarketRegime::BearQuiet
    }
}

/// Confidence in the current classification, in [0, 1].
///
/// Distance of the inputs from the nearest decision boundary: a close hugging
/// its SMA or a vol sitting on a split point yields low confidence. Returns
/// 0.0 when history is insufficient to classify at all.
pub fn confidence(bars: &[Bar]) -> f64 {
    let n = bars.len();
    if n < MIN_HISTORY {
        return 0.0;
    }
    let sma = Sma::new(TREND_PERIOD).compute(bars);
    let vol = RealizedVol::new(VOL_PERIOD).compute(bars);
    let close = bars[n - 1].close;
    let (s, v) = (sma[n - 1], vol[n - 1]);
    if !close.is_finite() || !s.is_finite() || !v.is_finite() || s <= 0.0 {
        return 0.0;
    }

    let trend_margin = ((close / s - 1.0).abs() / 0.05).min(1.0);
    let vol_margin = [BULL_VOL_SPLIT, BEAR_VOL_SPLIT, CRASH_VOL]
        .iter()
        .map(|b| (v - b).abs())
        .fold(f64::INFINITY, f64::min);
    let vol_margin = (vol_margin / 0.05).min(1.0);

    0.5 * (trend_margin + vol_margin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn geometric_closes(start: f64, step: impl Fn(usize) -> f64, n: usize) -> Vec<f64> {
        let mut closes = Vec::with_capacity(n);
        let mut price = start;
        for i in 0..n {
            closes.push(price);
            price *= 1.0 + step(i);
        }
        closes
    }

    #[test]
    fn short_history_is_neutral() {
        let bars = make_bars(&geometric_closes(100.0, |_| 0.001, 150));
        assert_eq!(classify(&bars), MarketRegime::Neutral);
        assert_eq!(confidence(&bars), 0.0);
    }

    #[test]
    fn steady_uptrend_is_bull_quiet() {
        let bars = make_bars(&geometric_closes(100.0, |_| 0.001, 250));
        assert_eq!(classify(&bars), MarketRegime::BullQuiet);
    }

    #[test]
    fn steady_downtrend_is_bear_quiet() {
        let bars = make_bars(&geometric_closes(100.0, |_| -0.001, 250));
        assert_eq!(classify(&bars), MarketRegime::BearQuiet);
    }

    #[test]
    fn choppy_uptrend_is_bull_volatile() {
        // Alternating +3%/-1%: net uptrend, annualized vol ~0.33.
        let closes = geometric_closes(100.0, |i| if i % 2 == 0 { 0.03 } else { -0.01 }, 250);
        let bars = make_bars(&closes);
        assert_eq!(classify(&bars), MarketRegime::BullVolatile);
    }

    #[test]
    fn choppy_downtrend_is_bear_volatile() {
        let closes = geometric_closes(100.0, |i| if i % 2 == 0 { -0.03 } else { 0.01 }, 250);
        let bars = make_bars(&closes);
        assert_eq!(classify(&bars), MarketRegime::BearVolatile);
    }

    #[test]
    fn extreme_vol_is_crash_even_in_uptrend() {
        // Alternating +8%/-6%: net drift upward but vol far above the crash bar.
        let closes = geometric_closes(100.0, |i| if i % 2 == 0 { 0.08 } else { -0.06 }, 250);
        let bars = make_bars(&closes);
        assert_eq!(classify(&bars), MarketRegime::Crash);
    }

    #[test]
    fn series_warmup_is_neutral() {
        let bars = make_bars(&geometric_closes(100.0, |_| 0.001, 250));
        let series = classify_series(&bars);
        assert_eq!(series.len(), 250);
        assert!(series[..MIN_HISTORY - 1]
            .iter()
            .all(|r| *r == MarketRegime::Neutral));
        assert_eq!(series[249], MarketRegime::BullQuiet);
    }

    #[test]
    fn confidence_is_bounded() {
        let bars = make_bars(&geometric_closes(100.0, |_| 0.001, 250));
        let c = confidence(&bars);
        assert!((0.0..=1.0).contains(&c), "confidence {c} out of range");
    }

    #[test]
    fn strong_trend_has_higher_confidence_than_flat() {
        let trending = make_bars(&geometric_closes(100.0, |_| 0.002, 250));
        let flat = make_bars(&geometric_closes(100.0, |_| 0.0, 250));
        assert!(confidence(&trending) > confidence(&flat));
    }
}
