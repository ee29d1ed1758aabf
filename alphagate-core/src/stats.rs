//! Shared statistical helpers.
//!
//! Pure functions over f64 slices. Degenerate inputs (too few points, zero
//! variance) return `None` from the correlation helpers rather than NaN, so
//! callers choose their own fallback explicitly.

const EPSILON: f64 = 1e-15;

/// Arithmetic mean. Returns 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n-1 denominator). Returns 0.0 for fewer than
/// two values.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Pearson correlation. `None` when the series are shorter than two points,
/// mismatched in length, or either has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x);
    let my = mean(y);
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&a, &b) in x.iter().zip(y.iter()) {
        cov += (a - mx) * (b - my);
        var_x += (a - mx).powi(2);
        var_y += (b - my).powi(2);
    }
    if var_x < EPSILON || var_y < EPSILON {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Spearman rank correlation with average ranks for ties.
///
/// `None` when fewer than three paired points remain or either side is
/// constant. This is the IC (information coefficient) primitive: rank-based,
/// so outlier returns cannot dominate the estimate.
pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 3 {
        return None;
    }
    let rx = ranks(x);
    let ry = ranks(y);
    pearson(&rx, &ry)
}

/// Lag-1 autocorrelation: Pearson of the series against itself shifted by one.
pub fn autocorr_lag1(values: &[f64]) -> Option<f64> {
    if values.len() < 3 {
        return None;
    }
    pearson(&values[..values.len() - 1], &values[1..])
}

/// Average ranks (1-based); tied values share the mean of their rank span.
fn ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut result = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && (values[order[j + 1]] - values[order[i]]).abs() < EPSILON {
            j += 1;
        }
        // ranks i+1 ..= j+1 averaged over the tie group
        let avg = (i + 1 + j + 1) as f64 / 2.0;
        for &idx in &order[i..=j] {
            result[idx] = avg;
        }
        i = j + 1;
    }
    result
}

/// Clamp a value into `[lo, hi]`.
pub fn clip(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}
