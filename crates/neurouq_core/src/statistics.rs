//! Column-wise sample statistics over ensemble rows.

/// Percentile levels reported for every quantity.
pub mod percentile {
    pub const P5: f64 = 0.05;
    pub const P95: f64 = 0.95;
}

/// Linear-interpolation quantile (type 7) of already sorted data.
///
/// `None` for empty data or `p` outside `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 || !(0.0..=1.0).contains(&p) {
        return None;
    }
    if n == 1 {
        return Some(sorted[0]);
    }

    let h = (n - 1) as f64 * p;
    let j = h.floor() as usize;
    let g = h - h.floor();
    if j + 1 >= n {
        Some(sorted[n - 1])
    } else {
        Some((1.0 - g) * sorted[j] + g * sorted[j + 1])
    }
}

/// Pointwise mean of equally long rows.
pub fn column_mean(rows: &[Vec<f64>]) -> Vec<f64> {
    let width = rows.first().map_or(0, Vec::len);
    let n = rows.len() as f64;
    let mut mean = vec![0.0; width];
    for row in rows {
        for (m, v) in mean.iter_mut().zip(row) {
            *m += v;
        }
    }
    mean.iter_mut().for_each(|m| *m /= n);
    mean
}

/// Pointwise population variance (divides by `N`).
pub fn column_variance(rows: &[Vec<f64>], mean: &[f64]) -> Vec<f64> {
    let n = rows.len() as f64;
    let mut variance = vec![0.0; mean.len()];
    for row in rows {
        for ((s, v), m) in variance.iter_mut().zip(row).zip(mean) {
            *s += (v - m) * (v - m);
        }
    }
    variance.iter_mut().for_each(|s| *s /= n);
    variance
}

/// Pointwise quantiles at each level in `levels`, `[level][point]`.
pub fn column_quantiles(rows: &[Vec<f64>], levels: &[f64]) -> Vec<Vec<f64>> {
    let width = rows.first().map_or(0, Vec::len);
    let mut out = vec![vec![f64::NAN; width]; levels.len()];
    let mut column = Vec::with_capacity(rows.len());

    for point in 0..width {
        column.clear();
        column.extend(rows.iter().map(|row| row[point]));
        column.sort_by(f64::total_cmp);
        for (level, p) in levels.iter().enumerate() {
            if let Some(q) = quantile_sorted(&column, *p) {
                out[level][point] = q;
            }
        }
    }
    out
}
