//! Stats module - descriptive statistics and grouped aggregations

mod correlation;
mod descriptive;
mod loss_ratio;
mod outliers;
mod segments;
mod temporal;

pub use correlation::{pearson_correlation, CorrelationMatrix};
pub use descriptive::{analyze_distributions, compute_distribution, percentile, DistributionStats};
pub use loss_ratio::{loss_ratio_by, overall_loss_ratio, LossRatioRow};
pub use outliers::{detect_outliers, OutlierMethod, OutlierReport};
pub use segments::{claims_by_segment, SegmentClaimsRow};
pub use temporal::{monthly_trend, TemporalRow};

use polars::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Column not found: {0}")]
    ColumnNotFound(String),
}

/// Fetch a column or report which name was missing.
pub(crate) fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, StatsError> {
    df.column(name)
        .map_err(|_| StatsError::ColumnNotFound(name.to_string()))
}

/// Extract a column as finite f64 values, dropping nulls and NaNs.
pub fn column_f64(df: &DataFrame, name: &str) -> Result<Vec<f64>, StatsError> {
    Ok(require_column(df, name)?
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .collect())
}

/// Extract a column as f64 values aligned with row indices (nulls preserved).
pub(crate) fn column_f64_aligned(
    df: &DataFrame,
    name: &str,
) -> Result<Vec<Option<f64>>, StatsError> {
    Ok(require_column(df, name)?
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Render a group key cell, bucketing nulls instead of dropping the row.
pub(crate) fn key_to_string(value: &AnyValue) -> String {
    if value.is_null() {
        "(missing)".to_string()
    } else {
        value.to_string().trim_matches('"').to_string()
    }
}

/// Extract the values of a value column split by the distinct values of a
/// group column, sorted by group name.
pub fn values_by_group(
    df: &DataFrame,
    group_col: &str,
    value_col: &str,
) -> Result<Vec<(String, Vec<f64>)>, StatsError> {
    require_column(df, value_col)?;
    let unique = require_column(df, group_col)?.unique()?;
    let series = unique.as_materialized_series();

    let mut names: Vec<String> = (0..series.len())
        .filter_map(|i| {
            let val = series.get(i).ok()?;
            if val.is_null() {
                None
            } else {
                Some(val.to_string().trim_matches('"').to_string())
            }
        })
        .collect();
    names.sort();

    let mut groups = Vec::with_capacity(names.len());
    for name in names {
        let filtered = df
            .clone()
            .lazy()
            .filter(col(group_col).cast(DataType::String).eq(lit(name.as_str())))
            .select([col(value_col)])
            .collect()?;
        let values = column_f64(&filtered, value_col)?;
        groups.push((name, values));
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_by_group_splits_and_sorts() {
        let df = DataFrame::new(vec![
            Column::new("Province".into(), vec!["B", "A", "B"]),
            Column::new("TotalClaims".into(), vec![1.0f64, 2.0, 3.0]),
        ])
        .unwrap();

        let groups = values_by_group(&df, "Province", "TotalClaims").unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "A");
        assert_eq!(groups[0].1, vec![2.0]);
        assert_eq!(groups[1].0, "B");
        assert_eq!(groups[1].1, vec![1.0, 3.0]);
    }

    #[test]
    fn column_f64_reports_missing_column() {
        let df = DataFrame::new(vec![Column::new("a".into(), vec![1.0f64])]).unwrap();
        assert!(matches!(
            column_f64(&df, "nope"),
            Err(StatsError::ColumnNotFound(_))
        ));
    }
}
