//! Outlier Detection Module
//! IQR-fence and z-score flagging of extreme rows.

use polars::prelude::*;
use serde::Serialize;

use super::{column_f64_aligned, percentile, StatsError};

/// Threshold for the z-score method.
const Z_SCORE_CUTOFF: f64 = 3.0;

/// Multiplier applied to the IQR when placing the fences.
const IQR_FENCE: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMethod {
    Iqr,
    ZScore,
}

/// Row indices flagged as outliers for one column.
#[derive(Debug, Clone, Serialize)]
pub struct OutlierReport {
    pub column: String,
    pub method: OutlierMethod,
    pub indices: Vec<usize>,
}

/// Detect outliers in the given columns.
///
/// Indices refer to rows of the input DataFrame; rows with a null value in
/// the column are never flagged.
pub fn detect_outliers(
    df: &DataFrame,
    columns: &[String],
    method: OutlierMethod,
) -> Result<Vec<OutlierReport>, StatsError> {
    columns
        .iter()
        .map(|name| {
            let aligned = column_f64_aligned(df, name)?;
            let indices = match method {
                OutlierMethod::Iqr => iqr_outliers(&aligned),
                OutlierMethod::ZScore => z_score_outliers(&aligned),
            };
            Ok(OutlierReport {
                column: name.clone(),
                method,
                indices,
            })
        })
        .collect()
}

fn iqr_outliers(aligned: &[Option<f64>]) -> Vec<usize> {
    let mut present: Vec<f64> = aligned.iter().flatten().copied().collect();
    if present.len() < 2 {
        return Vec::new();
    }
    present.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let q1 = percentile(&present, 25.0);
    let q3 = percentile(&present, 75.0);
    let iqr = q3 - q1;
    let low = q1 - IQR_FENCE * iqr;
    let high = q3 + IQR_FENCE * iqr;

    aligned
        .iter()
        .enumerate()
        .filter_map(|(i, v)| match v {
            Some(x) if *x < low || *x > high => Some(i),
            _ => None,
        })
        .collect()
}

fn z_score_outliers(aligned: &[Option<f64>]) -> Vec<usize> {
    let present: Vec<f64> = aligned.iter().flatten().copied().collect();
    let n = present.len();
    if n < 2 {
        return Vec::new();
    }

    let mean = present.iter().sum::<f64>() / n as f64;
    let variance = present.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std = variance.sqrt();
    if std == 0.0 || !std.is_finite() {
        return Vec::new();
    }

    aligned
        .iter()
        .enumerate()
        .filter_map(|(i, v)| match v {
            Some(x) if ((x - mean) / std).abs() > Z_SCORE_CUTOFF => Some(i),
            _ => None,
        })
        .collect()
}
