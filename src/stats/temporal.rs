//! Temporal Trend Module
//! Calendar-month aggregation of a value column over a date column.

use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;

use super::{require_column, StatsError};

/// One calendar month of aggregated values.
///
/// `month` is the first day of the month. `mean` is `None` for a month
/// whose rows carry only null values.
#[derive(Debug, Clone, Serialize)]
pub struct TemporalRow {
    pub month: NaiveDate,
    pub mean: Option<f64>,
    pub sum: f64,
    pub count: u32,
}

/// Aggregate a value column into monthly mean/sum/count buckets.
///
/// Rows with a null date are excluded. Output is sorted ascending by month.
pub fn monthly_trend(
    df: &DataFrame,
    date_col: &str,
    value_col: &str,
) -> Result<Vec<TemporalRow>, StatsError> {
    require_column(df, date_col)?;
    require_column(df, value_col)?;

    let grouped = df
        .clone()
        .lazy()
        .filter(col(date_col).is_not_null())
        .group_by([
            col(date_col).dt().year().cast(DataType::Int32).alias("year"),
            col(date_col)
                .dt()
                .month()
                .cast(DataType::Int32)
                .alias("month"),
        ])
        .agg([
            col(value_col).cast(DataType::Float64).mean().alias("mean"),
            col(value_col).cast(DataType::Float64).sum().alias("sum"),
            col(value_col).count().alias("count"),
        ])
        .collect()?;

    let years = grouped.column("year")?.i32()?;
    let months = grouped.column("month")?.i32()?;
    let means = grouped.column("mean")?.f64()?;
    let sums = grouped.column("sum")?.f64()?;
    let counts = grouped.column("count")?.u32()?;

    let mut rows = Vec::with_capacity(grouped.height());
    for i in 0..grouped.height() {
        let (Some(year), Some(month)) = (years.get(i), months.get(i)) else {
            continue;
        };
        let Some(first_of_month) = NaiveDate::from_ymd_opt(year, month as u32, 1) else {
            continue;
        };

        rows.push(TemporalRow {
            month: first_of_month,
            mean: means.get(i),
            sum: sums.get(i).unwrap_or(0.0),
            count: counts.get(i).unwrap_or(0),
        });
    }

    rows.sort_by_key(|r| r.month);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_df() -> DataFrame {
        let dates = vec![
            Some(NaiveDate::from_ymd_opt(2015, 1, 5).unwrap()),
            Some(NaiveDate::from_ymd_opt(2015, 1, 20).unwrap()),
            Some(NaiveDate::from_ymd_opt(2015, 3, 2).unwrap()),
            None,
        ];
        DataFrame::new(vec![
            Column::new("Date".into(), dates),
            Column::new("TotalClaims".into(), vec![10.0f64, 30.0, 7.0, 99.0]),
        ])
        .unwrap()
    }

    #[test]
    fn months_are_bucketed_and_sorted() {
        let rows = monthly_trend(&sample_df(), "Date", "TotalClaims").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].month, NaiveDate::from_ymd_opt(2015, 1, 1).unwrap());
        assert_eq!(rows[1].month, NaiveDate::from_ymd_opt(2015, 3, 1).unwrap());
    }

    #[test]
    fn aggregates_match_known_values() {
        let rows = monthly_trend(&sample_df(), "Date", "TotalClaims").unwrap();
        assert_relative_eq!(rows[0].mean.unwrap(), 20.0);
        assert_relative_eq!(rows[0].sum, 40.0);
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[1].count, 1);
    }

    #[test]
    fn null_dates_are_excluded() {
        let rows = monthly_trend(&sample_df(), "Date", "TotalClaims").unwrap();
        let total: u32 = rows.iter().map(|r| r.count).sum();
        assert_eq!(total, 3);
    }
}
