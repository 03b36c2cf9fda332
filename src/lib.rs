//! goldencmp compares freshly rendered frames against accepted golden images.
//!
//! Each pair flows through the same pipeline: decode both files into RGB
//! `PixelGrid`s, compute SSIM (with its local map) and pixel error statistics,
//! apply the acceptance `Policy` of the selected `ComparisonType`, and for
//! failing pairs write a diff composite and an SSIM heatmap. Batch runs pair
//! files by name across two directories and aggregate the results into a
//! `BatchReport` that serializes to JSON. Batch pairs can run in parallel via
//! the `rayon` feature; the `tracing` feature instruments the pipeline.

pub mod artifact;
pub mod batch;
pub mod compare;
pub mod config;
pub mod image;
pub mod metrics;
pub mod policy;
pub mod report;
mod trace;
pub mod util;

pub use artifact::{generate_artifacts, write_artifacts, ArtifactNamer, ArtifactPaths};
pub use batch::{compare_batch, plan_batch, BatchPlan, PairJob};
pub use compare::{ArtifactOutcome, Comparer, ComparisonResult, Outcome};
pub use config::{CompareConfig, DEFAULT_OUTPUT_DIR};
pub use crate::image::io::load_pixel_grid;
pub use crate::image::PixelGrid;
pub use metrics::{compute_metrics, MetricSet, Metrics, SsimMap};
pub use policy::{evaluate, ComparisonType, Policy, Verdict};
pub use report::{BatchReport, ReportSummary, ResultRecord};
pub use util::{GoldenError, GoldenResult};
