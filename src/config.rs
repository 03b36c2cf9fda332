//! Comparison settings shared by single-pair and batch runs.

use crate::policy::{ComparisonType, Policy};
use std::path::PathBuf;

/// Default artifact directory.
pub const DEFAULT_OUTPUT_DIR: &str = "comparison_output";

/// Configuration for a `Comparer`.
#[derive(Clone, Debug, PartialEq)]
pub struct CompareConfig {
    /// Acceptance rule applied to every pair.
    pub policy: Policy,
    /// Directory receiving diff and heatmap images for failing pairs.
    pub output_dir: PathBuf,
    /// Run batch pairs on the rayon pool (requires the `rayon` feature).
    pub parallel: bool,
}

impl CompareConfig {
    /// Default configuration using the built-in policy of `comparison_type`.
    pub fn for_type(comparison_type: ComparisonType) -> Self {
        Self {
            policy: comparison_type.policy(),
            ..Self::default()
        }
    }
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            policy: Policy::default(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            parallel: false,
        }
    }
}
