//! Single-pair comparison pipeline.
//!
//! Load both images, compute metrics, apply the policy and, for failing
//! pairs, write artifacts. Per-pair errors become an `Outcome::Errored`
//! result instead of propagating, and artifact failures are recorded next to
//! the verdict without changing it.

use crate::artifact::{write_artifacts, ArtifactPaths};
use crate::config::CompareConfig;
use crate::image::io::load_pixel_grid;
use crate::image::PixelGrid;
use crate::metrics::{compute_metrics, MetricSet, Metrics};
use crate::policy::{evaluate, Policy, Verdict};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{GoldenError, GoldenResult};
use std::path::{Path, PathBuf};

/// Result of the optional artifact stage.
#[derive(Clone, Debug, PartialEq)]
pub enum ArtifactOutcome {
    /// The pair passed, so no artifacts were requested.
    NotRequested,
    /// Both artifacts were written.
    Written(ArtifactPaths),
    /// Generation failed; the verdict is unaffected.
    Failed(GoldenError),
}

/// Measured result or the per-pair error that prevented measurement.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Measured {
        metrics: Metrics,
        verdict: Verdict,
        artifacts: ArtifactOutcome,
    },
    Errored(GoldenError),
}

/// Immutable result of comparing one rendered image with its golden.
#[derive(Clone, Debug, PartialEq)]
pub struct ComparisonResult {
    rendered_path: PathBuf,
    golden_path: PathBuf,
    filename: String,
    policy: Policy,
    outcome: Outcome,
}

impl ComparisonResult {
    /// Returns the rendered image path.
    pub fn rendered_path(&self) -> &Path {
        &self.rendered_path
    }

    /// Returns the golden image path.
    pub fn golden_path(&self) -> &Path {
        &self.golden_path
    }

    /// Returns the rendered image's file name.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Returns the policy that was applied.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Returns the tagged outcome.
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Whether the pair was accepted. Errored pairs never pass.
    pub fn passed(&self) -> bool {
        match &self.outcome {
            Outcome::Measured { verdict, .. } => verdict.passed,
            Outcome::Errored(_) => false,
        }
    }

    /// Measured metrics, or `Metrics::SENTINEL` when the pair errored.
    pub fn metrics(&self) -> Metrics {
        match &self.outcome {
            Outcome::Measured { metrics, .. } => *metrics,
            Outcome::Errored(_) => Metrics::SENTINEL,
        }
    }

    /// Description of the policy rule applied to this pair.
    pub fn threshold_used(&self) -> String {
        match &self.outcome {
            Outcome::Measured { verdict, .. } => verdict.description.clone(),
            Outcome::Errored(_) => self.policy.description(),
        }
    }

    /// The load or shape error, if measurement failed.
    pub fn error(&self) -> Option<&GoldenError> {
        match &self.outcome {
            Outcome::Errored(err) => Some(err),
            Outcome::Measured { .. } => None,
        }
    }

    /// Artifact paths, present only for failing pairs whose artifacts were written.
    pub fn artifact_paths(&self) -> Option<&ArtifactPaths> {
        match &self.outcome {
            Outcome::Measured {
                artifacts: ArtifactOutcome::Written(paths),
                ..
            } => Some(paths),
            _ => None,
        }
    }

    /// The artifact generation error, if generation was attempted and failed.
    pub fn artifact_error(&self) -> Option<&GoldenError> {
        match &self.outcome {
            Outcome::Measured {
                artifacts: ArtifactOutcome::Failed(err),
                ..
            } => Some(err),
            _ => None,
        }
    }
}

/// Runs comparisons under a fixed configuration.
#[derive(Clone, Debug)]
pub struct Comparer {
    config: CompareConfig,
}

impl Comparer {
    /// Creates a comparer applying `policy` with default settings otherwise.
    pub fn new(policy: Policy) -> Self {
        Self {
            config: CompareConfig {
                policy,
                ..CompareConfig::default()
            },
        }
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: CompareConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the artifact directory.
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = output_dir.into();
        self
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    /// Compares one rendered image with its golden reference.
    pub fn compare(&self, rendered: &Path, golden: &Path) -> ComparisonResult {
        let paths = ArtifactPaths::for_source(&self.config.output_dir, rendered);
        self.compare_with_paths(rendered, golden, paths)
    }

    /// Computes metrics and the verdict for two in-memory grids.
    pub fn measure(
        &self,
        rendered: &PixelGrid,
        golden: &PixelGrid,
    ) -> GoldenResult<(MetricSet, Verdict)> {
        let set = compute_metrics(rendered, golden)?;
        let verdict = evaluate(
            &self.config.policy,
            set.metrics.ssim,
            set.metrics.max_channel_diff,
        );
        Ok((set, verdict))
    }

    pub(crate) fn compare_with_paths(
        &self,
        rendered: &Path,
        golden: &Path,
        paths: ArtifactPaths,
    ) -> ComparisonResult {
        let filename = rendered
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| rendered.display().to_string());
        let _guard = trace_span!("compare_pair", file = filename.as_str()).entered();

        let outcome = match self.load_and_measure(rendered, golden) {
            Err(err) => {
                trace_warn!("{}: {}", filename, err);
                Outcome::Errored(err)
            }
            Ok((rendered_grid, golden_grid, set, verdict)) => {
                let artifacts = if verdict.passed {
                    ArtifactOutcome::NotRequested
                } else {
                    match write_artifacts(&rendered_grid, &golden_grid, &set.ssim_map, &paths) {
                        Ok(()) => ArtifactOutcome::Written(paths),
                        Err(err) => {
                            trace_warn!("failed to generate artifacts for {}: {}", filename, err);
                            ArtifactOutcome::Failed(err)
                        }
                    }
                };
                Outcome::Measured {
                    metrics: set.metrics,
                    verdict,
                    artifacts,
                }
            }
        };

        let result = ComparisonResult {
            rendered_path: rendered.to_path_buf(),
            golden_path: golden.to_path_buf(),
            filename,
            policy: self.config.policy,
            outcome,
        };
        trace_event!("pair_compared", passed = result.passed());
        result
    }

    fn load_and_measure(
        &self,
        rendered: &Path,
        golden: &Path,
    ) -> GoldenResult<(PixelGrid, PixelGrid, MetricSet, Verdict)> {
        let rendered_grid = load_pixel_grid(rendered)?;
        let golden_grid = load_pixel_grid(golden)?;
        let (set, verdict) = self.measure(&rendered_grid, &golden_grid)?;
        Ok((rendered_grid, golden_grid, set, verdict))
    }
}

impl Default for Comparer {
    fn default() -> Self {
        Self::new(Policy::default())
    }
}
