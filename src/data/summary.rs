//! Dataset Summary Module
//! Profiles a loaded DataFrame: shape, dtypes, missing values, numeric
//! describe and categorical value counts.

use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

use super::is_numeric_dtype;
use crate::stats::percentile;

/// Name, dtype and missing count for one column.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: String,
    pub missing: usize,
}

/// Describe-style statistics for one numeric column.
#[derive(Debug, Clone, Serialize)]
pub struct NumericProfile {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Shape and per-column profile of a dataset.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: usize,
    pub column_profiles: Vec<ColumnProfile>,
    pub numeric: BTreeMap<String, NumericProfile>,
    pub categorical: BTreeMap<String, Vec<(String, usize)>>,
}

impl DatasetSummary {
    pub fn from_dataframe(df: &DataFrame) -> PolarsResult<Self> {
        let mut column_profiles = Vec::new();
        let mut numeric = BTreeMap::new();
        let mut categorical = BTreeMap::new();

        for column in df.get_columns() {
            let name = column.name().to_string();
            column_profiles.push(ColumnProfile {
                name: name.clone(),
                dtype: column.dtype().to_string(),
                missing: column.null_count(),
            });

            if is_numeric_dtype(column.dtype()) {
                let values: Vec<f64> = column
                    .cast(&DataType::Float64)?
                    .f64()?
                    .into_iter()
                    .flatten()
                    .filter(|v| !v.is_nan())
                    .collect();
                numeric.insert(name, Self::describe(&values));
            } else if matches!(column.dtype(), DataType::String) {
                categorical.insert(name, Self::value_counts(column)?);
            }
        }

        Ok(Self {
            rows: df.height(),
            columns: df.width(),
            column_profiles,
            numeric,
            categorical,
        })
    }

    /// Total missing cells across all columns.
    pub fn total_missing(&self) -> usize {
        self.column_profiles.iter().map(|p| p.missing).sum()
    }

    fn describe(values: &[f64]) -> NumericProfile {
        let n = values.len();
        if n == 0 {
            return NumericProfile {
                count: 0,
                mean: f64::NAN,
                std: f64::NAN,
                min: f64::NAN,
                q1: f64::NAN,
                median: f64::NAN,
                q3: f64::NAN,
                max: f64::NAN,
            };
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mean = values.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };

        NumericProfile {
            count: n,
            mean,
            std: variance.sqrt(),
            min: sorted[0],
            q1: percentile(&sorted, 25.0),
            median: percentile(&sorted, 50.0),
            q3: percentile(&sorted, 75.0),
            max: sorted[n - 1],
        }
    }

    /// Value counts for a string column, most frequent first.
    fn value_counts(column: &Column) -> PolarsResult<Vec<(String, usize)>> {
        let ca = column.str()?;
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for value in ca.into_iter().flatten() {
            *counts.entry(value.to_string()).or_default() += 1;
        }

        let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_df() -> DataFrame {
        DataFrame::new(vec![
            Column::new("Province".into(), vec!["A", "B", "A", "A"]),
            Column::new("TotalPremium".into(), vec![10.0f64, 20.0, 30.0, 40.0]),
        ])
        .unwrap()
    }

    #[test]
    fn summary_profiles_shape_and_dtypes() {
        let summary = DatasetSummary::from_dataframe(&sample_df()).unwrap();
        assert_eq!(summary.rows, 4);
        assert_eq!(summary.columns, 2);
        assert_eq!(summary.total_missing(), 0);
        assert!(summary.numeric.contains_key("TotalPremium"));
        assert!(summary.categorical.contains_key("Province"));
    }

    #[test]
    fn describe_matches_known_values() {
        let summary = DatasetSummary::from_dataframe(&sample_df()).unwrap();
        let profile = &summary.numeric["TotalPremium"];
        assert_eq!(profile.count, 4);
        assert_relative_eq!(profile.mean, 25.0);
        assert_relative_eq!(profile.median, 25.0);
        assert_relative_eq!(profile.q1, 17.5);
        assert_relative_eq!(profile.q3, 32.5);
        assert_relative_eq!(profile.min, 10.0);
        assert_relative_eq!(profile.max, 40.0);
    }

    #[test]
    fn value_counts_ordered_by_frequency() {
        let summary = DatasetSummary::from_dataframe(&sample_df()).unwrap();
        let counts = &summary.categorical["Province"];
        assert_eq!(counts[0], ("A".to_string(), 3));
        assert_eq!(counts[1], ("B".to_string(), 1));
    }
}
