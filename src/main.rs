//! ClaimLens - Insurance Portfolio CSV Analysis & Loss Ratio Chart Generator
//!
//! Loads a policy-level insurance CSV, computes loss ratios, distribution and
//! outlier statistics, monthly claim trends and vehicle segment aggregates,
//! then renders static charts and a JSON report.

mod charts;
mod data;
mod report;
mod stats;

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use charts::ChartPlotter;
use data::{DataLoader, DatasetSummary};
use report::AnalysisReport;
use stats::OutlierMethod;

#[derive(Parser, Debug)]
#[command(
    name = "claimlens",
    version,
    about = "Insurance portfolio EDA: loss ratios, distributions, trends and charts"
)]
struct Cli {
    /// Input CSV file with policy-level records
    #[arg(default_value = "data/insurance_data.csv")]
    input: PathBuf,

    /// Directory for charts and the JSON report
    #[arg(long, default_value = "reports")]
    out_dir: PathBuf,

    /// Column holding total claims per record
    #[arg(long, default_value = "TotalClaims")]
    claims_col: String,

    /// Column holding total premium per record
    #[arg(long, default_value = "TotalPremium")]
    premium_col: String,

    /// Date column used for the monthly trend
    #[arg(long, default_value = "Date")]
    date_col: String,

    /// Value column for the monthly trend (defaults to the claims column)
    #[arg(long)]
    value_col: Option<String>,

    /// Categorical columns to compute loss ratios for
    #[arg(long, value_delimiter = ',', default_values_t = [
        "Province".to_string(),
        "VehicleType".to_string(),
        "Gender".to_string(),
    ])]
    group_cols: Vec<String>,

    /// Numeric columns for distribution, outlier and correlation analysis
    #[arg(long, value_delimiter = ',', default_values_t = [
        "TotalPremium".to_string(),
        "TotalClaims".to_string(),
        "CustomValueEstimate".to_string(),
    ])]
    numeric_cols: Vec<String>,

    /// Vehicle make column for the segment aggregation
    #[arg(long, default_value = "Make")]
    make_col: String,

    /// Vehicle model column for the segment aggregation
    #[arg(long, default_value = "Model")]
    model_col: String,

    /// Compute the analysis and report without rendering charts
    #[arg(long)]
    skip_charts: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let mut loader = DataLoader::new(&cli.input);
    loader
        .load()
        .with_context(|| format!("loading {}", cli.input.display()))?;
    loader.preprocess(&cli.date_col)?;
    let df = loader.dataframe()?;

    let summary = DatasetSummary::from_dataframe(df)?;
    info!(
        "Loaded {} rows x {} columns from {}",
        summary.rows,
        summary.columns,
        cli.input.display()
    );
    info!("Missing cells after preprocessing: {}", summary.total_missing());

    let available: Vec<String> = loader.columns();
    let has = |name: &str| available.iter().any(|c| c == name);

    // Overall loss ratio
    let overall = stats::overall_loss_ratio(df, &cli.claims_col, &cli.premium_col)?;
    match overall {
        Some(ratio) => info!("Overall loss ratio: {:.4}", ratio),
        None => warn!("Overall loss ratio undefined: premium sum is zero"),
    }

    // Loss ratio per category
    let mut loss_ratio_by_category = BTreeMap::new();
    for group in &cli.group_cols {
        if !has(group) {
            warn!("Skipping loss ratio by {}: column not found", group);
            continue;
        }
        let rows =
            stats::loss_ratio_by(df, std::slice::from_ref(group), &cli.claims_col, &cli.premium_col)?;
        info!("Loss ratio by {}: {} groups", group, rows.len());
        for row in rows.iter().take(5) {
            match row.loss_ratio {
                Some(ratio) => info!("  {} = {:.4}", row.keys.join(" / "), ratio),
                None => info!("  {} = undefined (zero premium)", row.keys.join(" / ")),
            }
        }
        loss_ratio_by_category.insert(group.clone(), rows);
    }

    // Distributions and outliers over the numeric columns that exist
    let numeric_available = loader.numeric_columns();
    let numeric_cols: Vec<String> = cli
        .numeric_cols
        .iter()
        .filter(|name| {
            if numeric_available.iter().any(|c| &c == name) {
                true
            } else {
                warn!("Skipping column {}: not found or not numeric", name);
                false
            }
        })
        .cloned()
        .collect();

    let distributions = stats::analyze_distributions(df, &numeric_cols)?;
    for d in &distributions {
        info!(
            "{}: mean={:.2} std={:.2} skew={:.2} kurtosis={:.2}",
            d.column, d.mean, d.std, d.skew, d.kurtosis
        );
    }

    let mut outliers = stats::detect_outliers(df, &numeric_cols, OutlierMethod::Iqr)?;
    outliers.extend(stats::detect_outliers(df, &numeric_cols, OutlierMethod::ZScore)?);
    for report in &outliers {
        info!(
            "{} outliers in {}: {} rows",
            match report.method {
                OutlierMethod::Iqr => "IQR",
                OutlierMethod::ZScore => "z-score",
            },
            report.column,
            report.indices.len()
        );
    }

    // Monthly trend of the value column
    let value_col = cli.value_col.clone().unwrap_or_else(|| cli.claims_col.clone());
    let monthly_trend = if has(&cli.date_col) {
        match stats::monthly_trend(df, &cli.date_col, &value_col) {
            Ok(rows) => {
                info!("Monthly trend: {} months", rows.len());
                rows
            }
            Err(err) => {
                warn!("Skipping monthly trend: {}", err);
                Vec::new()
            }
        }
    } else {
        warn!("Skipping monthly trend: column {} not found", cli.date_col);
        Vec::new()
    };

    // Vehicle make/model claim aggregates
    let vehicle_claims = if has(&cli.make_col) && has(&cli.model_col) {
        let segments = stats::claims_by_segment(
            df,
            &[cli.make_col.clone(), cli.model_col.clone()],
            &cli.claims_col,
            &cli.premium_col,
        )?;
        info!("Vehicle claims: {} make/model segments", segments.len());
        segments
    } else {
        warn!(
            "Skipping vehicle claims: columns {}/{} not found",
            cli.make_col, cli.model_col
        );
        Vec::new()
    };

    // Correlation matrix
    let correlation = if numeric_cols.len() >= 2 {
        Some(stats::pearson_correlation(df, &numeric_cols)?)
    } else {
        None
    };

    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("creating {}", cli.out_dir.display()))?;

    let mut chart_paths = Vec::new();
    if cli.skip_charts {
        info!("Chart rendering skipped");
    } else {
        info!("Rendering charts to {}", cli.out_dir.display());

        for (group, rows) in &loss_ratio_by_category {
            let path = cli.out_dir.join(format!("loss_ratio_by_{}.png", slug(group)));
            match ChartPlotter::loss_ratio_bar(rows, group, &path) {
                Ok(()) => chart_paths.push(path),
                Err(err) => warn!("Failed to render loss ratio chart for {}: {}", group, err),
            }
        }

        for column in &numeric_cols {
            let values = stats::column_f64(df, column)?;

            let path = cli.out_dir.join(format!("distribution_{}.png", slug(column)));
            match ChartPlotter::histogram(&values, column, &path) {
                Ok(()) => chart_paths.push(path),
                Err(err) => warn!("Failed to render histogram for {}: {}", column, err),
            }

            let path = cli.out_dir.join(format!("boxplot_{}.png", slug(column)));
            let single = vec![(column.clone(), values)];
            match ChartPlotter::boxplot(&single, column, "", &path) {
                Ok(()) => chart_paths.push(path),
                Err(err) => warn!("Failed to render boxplot for {}: {}", column, err),
            }

            if let Some(group) = cli.group_cols.iter().find(|g| has(g)) {
                let path = cli
                    .out_dir
                    .join(format!("boxplot_{}_by_{}.png", slug(column), slug(group)));
                match stats::values_by_group(df, group, column) {
                    Ok(groups) => match ChartPlotter::boxplot(&groups, column, group, &path) {
                        Ok(()) => chart_paths.push(path),
                        Err(err) => {
                            warn!("Failed to render grouped boxplot for {}: {}", column, err)
                        }
                    },
                    Err(err) => warn!("Failed to split {} by {}: {}", column, group, err),
                }
            }
        }

        if !monthly_trend.is_empty() {
            let path = cli.out_dir.join(format!("monthly_{}.png", slug(&value_col)));
            match ChartPlotter::temporal_line(&monthly_trend, &value_col, &path) {
                Ok(()) => chart_paths.push(path),
                Err(err) => warn!("Failed to render monthly trend: {}", err),
            }
        }

        if let Some(matrix) = &correlation {
            let path = cli.out_dir.join("correlation_matrix.png");
            match ChartPlotter::correlation_heatmap(matrix, &path) {
                Ok(()) => chart_paths.push(path),
                Err(err) => warn!("Failed to render correlation heatmap: {}", err),
            }
        }

        info!("Rendered {} charts", chart_paths.len());
    }

    let report = AnalysisReport {
        source: cli.input.display().to_string(),
        generated_at: chrono::Utc::now(),
        rows: loader.row_count(),
        summary,
        overall_loss_ratio: overall,
        loss_ratio_by_category,
        distributions,
        outliers,
        monthly_trend,
        vehicle_claims,
        correlation,
        charts: chart_paths,
    };

    let report_path = cli.out_dir.join("report.json");
    report.write_json(&report_path)?;
    info!("Report written to {}", report_path.display());

    Ok(())
}

/// File-name-safe version of a column name.
fn slug(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}
