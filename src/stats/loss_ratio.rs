//! Loss Ratio Module
//! Portfolio and grouped loss ratios: sum(claims) / sum(premium).

use polars::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;

use super::{column_f64, key_to_string, require_column, StatsError};

/// Aggregate loss ratio for one group.
///
/// `loss_ratio` is `None` when the premium sum for the group is zero, so a
/// degenerate segment is reported rather than producing an infinity.
#[derive(Debug, Clone, Serialize)]
pub struct LossRatioRow {
    pub keys: Vec<String>,
    pub total_claims: f64,
    pub total_premium: f64,
    pub policy_count: u32,
    pub loss_ratio: Option<f64>,
}

fn ratio(total_claims: f64, total_premium: f64) -> Option<f64> {
    if total_premium == 0.0 || !total_premium.is_finite() || !total_claims.is_finite() {
        None
    } else {
        Some(total_claims / total_premium)
    }
}

/// Loss ratio over the whole portfolio.
pub fn overall_loss_ratio(
    df: &DataFrame,
    claims_col: &str,
    premium_col: &str,
) -> Result<Option<f64>, StatsError> {
    let total_claims: f64 = column_f64(df, claims_col)?.iter().sum();
    let total_premium: f64 = column_f64(df, premium_col)?.iter().sum();
    Ok(ratio(total_claims, total_premium))
}

/// Loss ratio per group, highest first.
///
/// Every input row lands in exactly one group; null keys form their own
/// `(missing)` group. Rows with an undefined ratio sort last, ties are
/// broken by key so repeated runs produce identical output.
pub fn loss_ratio_by(
    df: &DataFrame,
    group_cols: &[String],
    claims_col: &str,
    premium_col: &str,
) -> Result<Vec<LossRatioRow>, StatsError> {
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
                .alias("total_claims"),
            col(premium_col)
                .cast(DataType::Float64)
                .sum()
                .alias("total_premium"),
            len().alias("policy_count"),
        ])
        .collect()?;

    let claims = grouped.column("total_claims")?.f64()?;
    let premiums = grouped.column("total_premium")?.f64()?;
    let counts = grouped.column("policy_count")?.u32()?;
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

        let total_claims = claims.get(i).unwrap_or(0.0);
        let total_premium = premiums.get(i).unwrap_or(0.0);

        rows.push(LossRatioRow {
            keys,
            total_claims,
            total_premium,
            policy_count: counts.get(i).unwrap_or(0),
            loss_ratio: ratio(total_claims, total_premium),
        });
    }

    rows.sort_by(|a, b| match (a.loss_ratio, b.loss_ratio) {
        (Some(x), Some(y)) => y
            .partial_cmp(&x)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.keys.cmp(&b.keys)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.keys.cmp(&b.keys),
    });

    Ok(rows)
}
