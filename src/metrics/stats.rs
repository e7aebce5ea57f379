// src/metrics/stats.rs

//! Small descriptive-statistics helpers shared by the metric calculators.

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (Bessel's correction). `None` below two samples.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Coefficient of variation: sample standard deviation over mean.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    if avg == 0.0 {
        return None;
    }
    Some(sample_std_dev(values)? / avg)
}

pub fn sort_ascending(values: &mut [f64]) {
    values.sort_by(|a, b| a.total_cmp(b));
}

/// Keeps values inside the 1.5×IQR fences. Quartiles are read at indices
/// n/4 and 3n/4 of the sorted input.
pub fn iqr_filter(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let mut sorted = values.to_vec();
    sort_ascending(&mut sorted);

    let q1 = sorted[sorted.len() / 4];
    let q3 = sorted[sorted.len() * 3 / 4];
    let iqr = q3 - q1;
    let lower = q1 - 1.5 * iqr;
    let upper = q3 + 1.5 * iqr;

    sorted
        .into_iter()
        .filter(|v| *v >= lower && *v <= upper)
        .collect()
}

/// Mean after dropping `fraction` of the samples from each end.
pub fn trimmed_mean(values: &[f64], fraction: f64) -> Option<f64> {
    let mut sorted = values.to_vec();
    sort_ascending(&mut sorted);
    let trim = (sorted.len() as f64 * fraction).floor() as usize;
    if trim > 0 && trim * 2 < sorted.len() {
        return mean(&sorted[trim..sorted.len() - trim]);
    }
    mean(&sorted)
}

/// Nearest-rank style percentile: index floor(n × p), clamped to the last element.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sort_ascending(&mut sorted);
    let idx = ((sorted.len() as f64 * p) as usize).min(sorted.len() - 1);
    Some(sorted[idx])
}

pub fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_sample_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), Some(5.0));
        let sd = sample_std_dev(&values).unwrap();
        assert!((sd - 2.138).abs() < 1e-3);
        assert_eq!(sample_std_dev(&[1.0]), None);
    }

    #[test]
    fn test_iqr_filter_drops_outlier() {
        let values = [10.0, 11.0, 12.0, 11.0, 10.0, 12.0, 11.0, 500.0];
        let filtered = iqr_filter(&values);
        assert_eq!(filtered.len(), 7);
        assert!(!filtered.contains(&500.0));
    }

    #[test]
    fn test_trimmed_mean_removes_extremes() {
        let mut values: Vec<f64> = (1..=20).map(|v| v as f64).collect();
        values[19] = 1000.0;
        // 5% of 20 trims one sample from each end.
        let trimmed = trimmed_mean(&values, 0.05).unwrap();
        assert!((trimmed - 10.5).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_clamps() {
        let values = [1.0, 2.0, 3.0];
        assert_eq!(percentile(&values, 0.95), Some(3.0));
        assert_eq!(percentile(&values, 0.0), Some(1.0));
        assert_eq!(percentile(&[], 0.5), None);
    }
}
