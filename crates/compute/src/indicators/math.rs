//! Shared numeric primitives for the indicators.
//!
//! Population statistics (divide by n, like the rest of the engine), score
//! clamping, the log-ratio mapping and recency decay weights.

/// Neutral "no signal" score.
pub const NEUTRAL: f64 = 50.0;

/// Clamp to [0, 100]. Non-finite values collapse to neutral.
pub fn clamp_score(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 100.0)
    } else {
        NEUTRAL
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation. Zero for fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Z-score of `value` against `history`; zero when the history has no spread.
pub fn z_score(value: f64, history: &[f64]) -> f64 {
    let sd = std_dev(history);
    if sd <= f64::EPSILON {
        return 0.0;
    }
    (value - mean(history)) / sd
}

/// Map a ratio to a score with `50 + 15·log2(ratio)`.
///
/// 2x maps to 65, 0.5x to 35. Non-positive ratios map to 30.
pub fn log_ratio_score(ratio: f64) -> f64 {
    if ratio <= 0.0 || !ratio.is_finite() {
        return 30.0;
    }
    clamp_score(50.0 + 15.0 * ratio.log2())
}

/// Exponential decay weights where the last element (most recent) gets 1.0
/// and each step back multiplies by `decay`.
pub fn decay_weights(n: usize, decay: f64) -> Vec<f64> {
    (0..n).map(|i| decay.powi((n - 1 - i) as i32)).collect()
}

/// Weighted mean, or `None` when the weights sum to zero.
pub fn weighted_average(values: &[f64], weights: &[f64]) -> Option<f64> {
    let total: f64 = weights.iter().take(values.len()).sum();
    if total <= 0.0 {
        return None;
    }
    let sum: f64 = values.iter().zip(weights).map(|(v, w)| v * w).sum();
    Some(sum / total)
}

/// Least-squares slope of `ys` against `0..n`. Zero for fewer than two points.
pub fn slope(ys: &[f64]) -> f64 {
    let n = ys.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(ys);
    let (mut num, mut den) = (0.0, 0.0);
    for (i, y) in ys.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Pearson correlation of `ys` against `0..n`; zero when either side is flat.
pub fn correlation(ys: &[f64]) -> f64 {
    let n = ys.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(ys);
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (i, y) in ys.iter().enumerate() {
        let dx = i as f64 - x_mean;
        let dy = y - y_mean;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= f64::EPSILON || syy <= f64::EPSILON {
        return 0.0;
    }
    sxy / (sxx.sqrt() * syy.sqrt())
}

/// Round to two decimals for presentation in details maps.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn clamp_bounds_and_nan() {
        assert_eq!(clamp_score(-5.0), 0.0);
        assert_eq!(clamp_score(120.0), 100.0);
        assert_eq!(clamp_score(f64::NAN), NEUTRAL);
        assert_eq!(clamp_score(42.0), 42.0);
    }

    #[test]
    fn z_score_population() {
        // mean 2, population std sqrt(2/3)
        let h = [1.0, 2.0, 3.0];
        assert!(approx(z_score(2.0, &h), 0.0));
        assert!(approx(z_score(3.0, &h), 1.0 / (2.0f64 / 3.0).sqrt()));
        assert_eq!(z_score(10.0, &[5.0, 5.0, 5.0]), 0.0);
        assert_eq!(z_score(10.0, &[5.0]), 0.0);
    }

    #[test]
    fn log_ratio_mapping() {
        assert!(approx(log_ratio_score(1.0), 50.0));
        assert!(approx(log_ratio_score(2.0), 65.0));
        assert!(approx(log_ratio_score(0.5), 35.0));
        assert_eq!(log_ratio_score(0.0), 30.0);
        assert_eq!(log_ratio_score(1e12), 100.0);
    }

    #[test]
    fn decay_weights_favor_last() {
        let w = decay_weights(3, 0.5);
        assert_eq!(w, vec![0.25, 0.5, 1.0]);
        assert!(decay_weights(0, 0.85).is_empty());
    }

    #[test]
    fn weighted_average_zero_weight() {
        assert_eq!(weighted_average(&[10.0, 20.0], &[0.0, 0.0]), None);
        assert_eq!(weighted_average(&[10.0, 20.0], &[1.0, 3.0]), Some(17.5));
    }

    #[test]
    fn slope_and_correlation() {
        let ys = [1.0, 2.0, 3.0, 4.0];
        assert!(approx(slope(&ys), 1.0));
        assert!(approx(correlation(&ys), 1.0));
        let down = [4.0, 3.0, 2.0, 1.0];
        assert!(approx(slope(&down), -1.0));
        assert!(approx(correlation(&down), -1.0));
        assert_eq!(correlation(&[2.0, 2.0, 2.0]), 0.0);
        assert_eq!(slope(&[7.0]), 0.0);
    }
}
