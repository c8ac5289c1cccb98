//! Descriptive Statistics Module
//! Per-column distribution statistics: moments, quartiles and shape.

use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;

use super::{column_f64, StatsError};

/// Distribution statistics for a single numeric column.
///
/// `skew` is the adjusted Fisher-Pearson coefficient and `kurtosis` the
/// unbiased excess kurtosis, both matching the usual data-frame conventions.
#[derive(Debug, Clone, Serialize)]
pub struct DistributionStats {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub skew: f64,
    pub kurtosis: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl Default for DistributionStats {
    fn default() -> Self {
        Self {
            column: String::new(),
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            skew: f64::NAN,
            kurtosis: f64::NAN,
            min: f64::NAN,
            q1: f64::NAN,
            median: f64::NAN,
            q3: f64::NAN,
            max: f64::NAN,
        }
    }
}

/// Compute distribution statistics for an array of values.
pub fn compute_distribution(values: &[f64]) -> DistributionStats {
    let n = values.len();
    if n == 0 {
        return DistributionStats::default();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let nf = n as f64;
    let mean = values.iter().sum::<f64>() / nf;
    let variance = if n > 1 {
        values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (nf - 1.0)
    } else {
        0.0
    };
    let std = variance.sqrt();

    let m2 = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / nf;
    let m3 = values.iter().map(|x| (x - mean).powi(3)).sum::<f64>() / nf;
    let m4 = values.iter().map(|x| (x - mean).powi(4)).sum::<f64>() / nf;

    let skew = if n >= 3 && m2 > 0.0 {
        let g1 = m3 / m2.powf(1.5);
        g1 * (nf * (nf - 1.0)).sqrt() / (nf - 2.0)
    } else {
        f64::NAN
    };

    let kurtosis = if n >= 4 && m2 > 0.0 {
        let g2 = m4 / (m2 * m2) - 3.0;
        ((nf + 1.0) * g2 + 6.0) * (nf - 1.0) / ((nf - 2.0) * (nf - 3.0))
    } else {
        f64::NAN
    };

    DistributionStats {
        column: String::new(),
        count: n,
        mean,
        std,
        skew,
        kurtosis,
        min: sorted[0],
        q1: percentile(&sorted, 25.0),
        median: percentile(&sorted, 50.0),
        q3: percentile(&sorted, 75.0),
        max: sorted[n - 1],
    }
}

/// Calculate percentile using linear interpolation (NumPy compatible).
/// The input slice must already be sorted.
pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    let n = sorted_values.len();
    if n == 0 {
        return f64::NAN;
    }
    if n == 1 {
        return sorted_values[0];
    }

    let rank = (p / 100.0) * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = (rank.ceil() as usize).min(n - 1);
    let frac = rank - lower as f64;

    if lower == upper {
        sorted_values[lower]
    } else {
        sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
    }
}

/// Compute distribution statistics for the given columns in parallel.
pub fn analyze_distributions(
    df: &DataFrame,
    columns: &[String],
) -> Result<Vec<DistributionStats>, StatsError> {
    columns
        .par_iter()
        .map(|name| {
            let values = column_f64(df, name)?;
            let mut stats = compute_distribution(&values);
            stats.column = name.clone();
            Ok(stats)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn basic_moments() {
        let stats = compute_distribution(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(stats.count, 8);
        assert_relative_eq!(stats.mean, 5.0);
        assert_relative_eq!(stats.std, 32.0f64.sqrt() / 7.0f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(stats.min, 2.0);
        assert_relative_eq!(stats.max, 9.0);
        assert_relative_eq!(stats.median, 4.5);
    }

    #[test]
    fn skew_is_zero_for_symmetric_data() {
        let stats = compute_distribution(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_relative_eq!(stats.skew, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn skew_positive_for_right_tail() {
        let stats = compute_distribution(&[1.0, 1.0, 1.0, 1.0, 100.0]);
        assert!(stats.skew > 1.0);
    }

    #[test]
    fn kurtosis_matches_uniform_reference() {
        // Unbiased excess kurtosis of 1..=5 (pandas Series.kurtosis) is -1.2.
        let stats = compute_distribution(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_relative_eq!(stats.kurtosis, -1.2, epsilon = 1e-12);
    }

    #[test]
    fn small_samples_report_nan_shape() {
        let stats = compute_distribution(&[1.0, 2.0]);
        assert!(stats.skew.is_nan());
        assert!(stats.kurtosis.is_nan());
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let sorted = [10.0, 20.0, 30.0, 40.0];
        assert_relative_eq!(percentile(&sorted, 0.0), 10.0);
        assert_relative_eq!(percentile(&sorted, 50.0), 25.0);
        assert_relative_eq!(percentile(&sorted, 100.0), 40.0);
        assert_relative_eq!(percentile(&sorted, 25.0), 17.5);
    }

    #[test]
    fn analyze_distributions_labels_columns() {
        let df = DataFrame::new(vec![
            Column::new("a".into(), vec![1.0f64, 2.0, 3.0]),
            Column::new("b".into(), vec![10.0f64, 20.0, 30.0]),
        ])
        .unwrap();

        let all = analyze_distributions(&df, &["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].column, "a");
        assert_eq!(all[1].column, "b");
        assert_relative_eq!(all[1].mean, 20.0);
    }
}
