//! Small statistics helpers shared by the analyzers.
//!
//! All functions are total: empty or degenerate input maps to a neutral value
//! instead of NaN, so callers never have to filter non-finite results.

/// Arithmetic mean, 0.0 for empty input.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sample standard deviation (n - 1), 0.0 below two observations.
pub fn std_dev(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let m = mean(data);
    let variance = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (data.len() - 1) as f64;
    variance.sqrt()
}

/// Share of `data` strictly below `value`, on a 0-100 scale.
/// Returns 50.0 for empty data.
pub fn percent_below(value: f64, data: &[f64]) -> f64 {
    if data.is_empty() {
        return 50.0;
    }
    let count_below = data.iter().filter(|&&x| x < value).count();
    count_below as f64 / data.len() as f64 * 100.0
}

/// Least-squares slope of `values` against the index 0..n-1.
pub fn ols_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);

    let mut ss_xy = 0.0;
    let mut ss_xx = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        ss_xy += dx * (y - y_mean);
        ss_xx += dx * dx;
    }

    if ss_xx < 1e-15 {
        return 0.0;
    }
    ss_xy / ss_xx
}

/// Pearson correlation of two equally long samples.
/// `None` when fewer than two pairs or either side has no variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let x_mean = mean(&x[..n]);
    let y_mean = mean(&y[..n]);

    let mut ss_xy = 0.0;
    let mut ss_xx = 0.0;
    let mut ss_yy = 0.0;
    for i in 0..n {
        let dx = x[i] - x_mean;
        let dy = y[i] - y_mean;
        ss_xy += dx * dy;
        ss_xx += dx * dx;
        ss_yy += dy * dy;
    }

    if ss_xx < 1e-15 || ss_yy < 1e-15 {
        return None;
    }
    Some(ss_xy / (ss_xx * ss_yy).sqrt())
}

/// Simple relative change from `from` to `to`; `None` when `from` is zero.
pub fn simple_return(from: f64, to: f64) -> Option<f64> {
    if from == 0.0 {
        return None;
    }
    Some(to / from - 1.0)
}

/// Relative change over `periods` steps, aligned to the input.
/// The first `periods` entries are undefined.
pub fn pct_change(values: &[f64], periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if periods == 0 || i < periods {
                None
            } else {
                simple_return(values[i - periods], values[i])
            }
        })
        .collect()
}
