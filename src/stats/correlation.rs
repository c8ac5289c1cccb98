//! Correlation Module
//! Pearson correlation matrix over pairwise-complete observations.

use polars::prelude::*;
use serde::Serialize;

use super::{column_f64_aligned, StatsError};

/// Symmetric Pearson correlation matrix.
///
/// `values[i][j]` is the correlation between `columns[i]` and `columns[j]`.
/// Cells with fewer than two paired observations, or where either column is
/// constant over the pairs, are NaN (serialized as null).
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[i][j])
    }
}

/// Compute the Pearson correlation matrix for the given columns.
pub fn pearson_correlation(
    df: &DataFrame,
    columns: &[String],
) -> Result<CorrelationMatrix, StatsError> {
    let series: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|name| column_f64_aligned(df, name))
        .collect::<Result<_, _>>()?;

    let n = columns.len();
    let mut values = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = pairwise_pearson(&series[i], &series[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix {
        columns: columns.to_vec(),
        values,
    })
}

fn pairwise_pearson(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b.iter())
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    let n = pairs.len();
    if n < 2 {
        return f64::NAN;
    }

    let nf = n as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / nf;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / nf;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn perfectly_correlated_columns() {
        let df = DataFrame::new(vec![
            Column::new("a".into(), vec![1.0f64, 2.0, 3.0]),
            Column::new("b".into(), vec![2.0f64, 4.0, 6.0]),
            Column::new("c".into(), vec![3.0f64, 2.0, 1.0]),
        ])
        .unwrap();

        let cols = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let matrix = pearson_correlation(&df, &cols).unwrap();

        assert_relative_eq!(matrix.get("a", "a").unwrap(), 1.0);
        assert_relative_eq!(matrix.get("a", "b").unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(matrix.get("a", "c").unwrap(), -1.0, epsilon = 1e-12);
        assert_relative_eq!(
            matrix.get("b", "a").unwrap(),
            matrix.get("a", "b").unwrap()
        );
    }

    #[test]
    fn constant_column_is_undefined() {
        let df = DataFrame::new(vec![
            Column::new("a".into(), vec![1.0f64, 2.0, 3.0]),
            Column::new("flat".into(), vec![7.0f64, 7.0, 7.0]),
        ])
        .unwrap();

        let cols = vec!["a".to_string(), "flat".to_string()];
        let matrix = pearson_correlation(&df, &cols).unwrap();
        assert!(matrix.get("a", "flat").unwrap().is_nan());
    }

    #[test]
    fn nulls_use_pairwise_complete_observations() {
        let df = DataFrame::new(vec![
            Column::new("a".into(), vec![Some(1.0f64), Some(2.0), Some(3.0), Some(100.0)]),
            Column::new("b".into(), vec![Some(2.0f64), Some(4.0), Some(6.0), None]),
        ])
        .unwrap();

        let cols = vec!["a".to_string(), "b".to_string()];
        let matrix = pearson_correlation(&df, &cols).unwrap();
        // The (100.0, null) row drops out, leaving an exact linear relation.
        assert_relative_eq!(matrix.get("a", "b").unwrap(), 1.0, epsilon = 1e-12);
    }
}
