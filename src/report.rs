//! Batch reports and their JSON summary.
//!
//! Counts are always derived from the result list.

use crate::compare::ComparisonResult;
use crate::policy::ComparisonType;
use crate::util::{GoldenError, GoldenResult};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Ordered per-pair results for one run.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchReport {
    comparison_type: ComparisonType,
    results: Vec<ComparisonResult>,
    skipped: Vec<PathBuf>,
}

impl BatchReport {
    /// Builds a report from finished results and skipped rendered files.
    pub fn new(
        comparison_type: ComparisonType,
        results: Vec<ComparisonResult>,
        skipped: Vec<PathBuf>,
    ) -> Self {
        Self {
            comparison_type,
            results,
            skipped,
        }
    }

    /// Wraps a single-pair result.
    pub fn single(result: ComparisonResult) -> Self {
        let comparison_type = result.policy().kind();
        Self::new(comparison_type, vec![result], Vec::new())
    }

    /// Returns the comparison type used for the whole run.
    pub fn comparison_type(&self) -> ComparisonType {
        self.comparison_type
    }

    /// Returns the results in report order.
    pub fn results(&self) -> &[ComparisonResult] {
        &self.results
    }

    /// Returns rendered files that had no golden counterpart.
    pub fn skipped(&self) -> &[PathBuf] {
        &self.skipped
    }

    /// Number of matched pairs.
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Number of passing pairs.
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    /// Number of failing pairs, including pairs that could not be measured.
    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    /// Fraction of passing pairs, or `None` for an empty report.
    pub fn pass_rate(&self) -> Option<f64> {
        if self.results.is_empty() {
            return None;
        }
        Some(self.passed() as f64 / self.total() as f64)
    }

    /// Builds the serializable summary.
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            comparison_type: self.comparison_type,
            total_comparisons: self.total(),
            passed_comparisons: self.passed(),
            results: self.results.iter().map(ResultRecord::from).collect(),
            skipped: self
                .skipped
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
        }
    }

    /// Serializes the summary as pretty-printed JSON.
    pub fn to_json(&self) -> GoldenResult<String> {
        serde_json::to_string_pretty(&self.summary()).map_err(|err| GoldenError::Report {
            reason: err.to_string(),
        })
    }

    /// Writes the JSON summary to `path`.
    pub fn write_json(&self, path: &Path) -> GoldenResult<()> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|err| GoldenError::Report {
            reason: format!("{}: {err}", path.display()),
        })
    }
}

/// Machine-readable run summary.
#[derive(Clone, Debug, Serialize)]
pub struct ReportSummary {
    pub comparison_type: ComparisonType,
    pub total_comparisons: usize,
    pub passed_comparisons: usize,
    pub results: Vec<ResultRecord>,
    pub skipped: Vec<String>,
}

/// One result as it appears in the JSON summary.
///
/// A non-finite `mse_score` (the sentinel for unmeasured pairs) serializes as
/// `null`.
#[derive(Clone, Debug, Serialize)]
pub struct ResultRecord {
    pub ssim_score: f64,
    pub mse_score: f64,
    pub max_channel_diff: u8,
    pub rmse_normalized: f64,
    pub passed: bool,
    pub threshold_used: String,
    pub diff_image_path: Option<String>,
    pub heatmap_path: Option<String>,
    pub rendered_path: String,
    pub golden_path: String,
    pub filename: String,
    pub error: Option<String>,
}

impl From<&ComparisonResult> for ResultRecord {
    fn from(result: &ComparisonResult) -> Self {
        let metrics = result.metrics();
        let paths = result.artifact_paths();
        Self {
            ssim_score: metrics.ssim,
            mse_score: metrics.mse,
            max_channel_diff: metrics.max_channel_diff,
            rmse_normalized: metrics.rmse_normalized,
            passed: result.passed(),
            threshold_used: result.threshold_used(),
            diff_image_path: paths.map(|p| p.diff.display().to_string()),
            heatmap_path: paths.map(|p| p.heatmap.display().to_string()),
            rendered_path: result.rendered_path().display().to_string(),
            golden_path: result.golden_path().display().to_string(),
            filename: result.filename().to_string(),
            error: result.error().map(|err| err.to_string()),
        }
    }
}
