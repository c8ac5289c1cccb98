//! Segment Claims Module
//! Claim and premium aggregates per portfolio segment (e.g. vehicle
//! make/model).

use polars::prelude::*;
use serde::Serialize;

use super::{key_to_string, require_column, StatsError};

/// Aggregated claims for one segment.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentClaimsRow {
    pub keys: Vec<String>,
    pub claims_sum: f64,
    pub claims_mean: Option<f64>,
    pub claims_count: u32,
    pub premium_sum: f64,
}

/// Sum/mean/count of claims plus the premium sum per segment, ordered by
/// claims sum descending (ties broken by key).
pub fn claims_by_segment(
    df: &DataFrame,
    group_cols: &[String],
    claims_col: &str,
    premium_col: &str,
) -> Result<Vec<SegmentClaimsRow>, StatsError> {
    for name in group_cols {
        require_column(df, name)?;
    }
    require_column(df, claims_col)?;
    require_column(df, premium_col)?;

    let key_exprs: Vec<Expr> = group_cols.iter().map(|c| col(c.as_str())).collect();
    let grouped = df
        .clone()
        .lazy()
        .group_by(key_exprs)
        .agg([
            col(claims_col)
                .cast(DataType::Float64)
                .sum()
                .alias("claims_sum"),
            col(claims_col)
                .cast(DataType::Float64)
                .mean()
                .alias("claims_mean"),
            col(claims_col).count().alias("claims_count"),
            col(premium_col)
                .cast(DataType::Float64)
                .sum()
                .alias("premium_sum"),
        ])
        .collect()?;

    let sums = grouped.column("claims_sum")?.f64()?;
    let means = grouped.column("claims_mean")?.f64()?;
    let counts = grouped.column("claims_count")?.u32()?;
    let premiums = grouped.column("premium_sum")?.f64()?;
    let key_columns: Vec<&Column> = group_cols
        .iter()
        .map(|c| grouped.column(c.as_str()))
        .collect::<PolarsResult<_>>()?;

    let mut rows = Vec::with_capacity(grouped.height());
    for i in 0..grouped.height() {
        let keys: Vec<String> = key_columns
            .iter()
            .map(|column| column.get(i).map(|v| key_to_string(&v)))
            .collect::<PolarsResult<_>>()?;

        rows.push(SegmentClaimsRow {
            keys,
            claims_sum: sums.get(i).unwrap_or(0.0),
            claims_mean: means.get(i),
            claims_count: counts.get(i).unwrap_or(0),
            premium_sum: premiums.get(i).unwrap_or(0.0),
        });
    }

    rows.sort_by(|a, b| {
        b.claims_sum
            .partial_cmp(&a.claims_sum)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.keys.cmp(&b.keys))
    });

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_df() -> DataFrame {
        DataFrame::new(vec![
            Column::new("Make".into(), vec!["Toyota", "Toyota", "BMW"]),
            Column::new("Model".into(), vec!["Corolla", "Corolla", "X3"]),
            Column::new("TotalClaims".into(), vec![10.0f64, 20.0, 100.0]),
            Column::new("TotalPremium".into(), vec![50.0f64, 60.0, 70.0]),
        ])
        .unwrap()
    }

    #[test]
    fn segments_aggregate_and_sort_by_claims() {
        let rows = claims_by_segment(
            &sample_df(),
            &["Make".to_string(), "Model".to_string()],
            "TotalClaims",
            "TotalPremium",
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].keys, vec!["BMW".to_string(), "X3".to_string()]);
        assert_relative_eq!(rows[0].claims_sum, 100.0);
        assert_eq!(rows[1].keys, vec!["Toyota".to_string(), "Corolla".to_string()]);
        assert_relative_eq!(rows[1].claims_sum, 30.0);
        assert_relative_eq!(rows[1].claims_mean.unwrap(), 15.0);
        assert_eq!(rows[1].claims_count, 2);
        assert_relative_eq!(rows[1].premium_sum, 110.0);
    }
}
