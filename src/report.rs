//! Analysis Report Module
//! Serializes the full analysis output to a JSON file.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::data::DatasetSummary;
use crate::stats::{
    CorrelationMatrix, DistributionStats, LossRatioRow, OutlierReport, SegmentClaimsRow,
    TemporalRow,
};

/// Everything one analysis run produced.
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub rows: usize,
    pub summary: DatasetSummary,
    pub overall_loss_ratio: Option<f64>,
    pub loss_ratio_by_category: BTreeMap<String, Vec<LossRatioRow>>,
    pub distributions: Vec<DistributionStats>,
    pub outliers: Vec<OutlierReport>,
    pub monthly_trend: Vec<TemporalRow>,
    pub vehicle_claims: Vec<SegmentClaimsRow>,
    pub correlation: Option<CorrelationMatrix>,
    pub charts: Vec<PathBuf>,
}

impl AnalysisReport {
    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}
