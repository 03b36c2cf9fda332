//! Directory-to-directory batch comparison.
//!
//! Rendered files are paired with golden files of the identical name.
//! Rendered files without a counterpart are skipped with a warning and do not
//! count toward the totals. Artifact names are planned before any comparison
//! runs, so pairs share no mutable state and may run on the rayon pool; the
//! report is always sorted by file name.

use crate::artifact::{ArtifactNamer, ArtifactPaths};
use crate::compare::{Comparer, ComparisonResult};
use crate::image::io::is_supported_image;
use crate::report::BatchReport;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{GoldenError, GoldenResult};
use std::fs;
use std::path::{Path, PathBuf};

/// A matched rendered/golden pair with its reserved artifact paths.
#[derive(Clone, Debug, PartialEq)]
pub struct PairJob {
    pub rendered: PathBuf,
    pub golden: PathBuf,
    pub artifacts: ArtifactPaths,
}

/// Matched pairs plus rendered files lacking a golden reference.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchPlan {
    pub jobs: Vec<PairJob>,
    pub skipped: Vec<PathBuf>,
}

/// Enumerates and pairs images without comparing them.
///
/// Fails with `DirectoryNotFound` if either directory is missing.
pub fn plan_batch(
    rendered_dir: &Path,
    golden_dir: &Path,
    output_dir: &Path,
) -> GoldenResult<BatchPlan> {
    ensure_dir(rendered_dir)?;
    ensure_dir(golden_dir)?;

    let mut rendered_files = list_images(rendered_dir)?;
    rendered_files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut namer = ArtifactNamer::new(output_dir);
    let mut plan = BatchPlan::default();
    for rendered in rendered_files {
        let Some(name) = rendered.file_name() else {
            continue;
        };
        let golden = golden_dir.join(name);
        if !golden.is_file() {
            trace_warn!(
                "no golden reference for {}, skipping",
                name.to_string_lossy()
            );
            plan.skipped.push(rendered);
            continue;
        }
        let artifacts = namer.claim(&rendered);
        plan.jobs.push(PairJob {
            rendered,
            golden,
            artifacts,
        });
    }
    Ok(plan)
}

/// Compares every matched pair under `comparer`'s configuration.
pub fn compare_batch(
    rendered_dir: &Path,
    golden_dir: &Path,
    comparer: &Comparer,
) -> GoldenResult<BatchReport> {
    let _guard = trace_span!("compare_batch").entered();
    let config = comparer.config();
    let plan = plan_batch(rendered_dir, golden_dir, &config.output_dir)?;

    let mut results = run_jobs(comparer, plan.jobs, config.parallel);
    results.sort_by(|a, b| a.filename().cmp(b.filename()));

    let report = BatchReport::new(config.policy.kind(), results, plan.skipped);
    trace_event!(
        "batch_complete",
        total = report.total() as u64,
        passed = report.passed() as u64,
        skipped = report.skipped().len() as u64
    );
    Ok(report)
}

impl Comparer {
    /// Compares all images in `rendered_dir` against same-named goldens.
    pub fn compare_batch(
        &self,
        rendered_dir: &Path,
        golden_dir: &Path,
    ) -> GoldenResult<BatchReport> {
        compare_batch(rendered_dir, golden_dir, self)
    }
}

#[cfg(feature = "rayon")]
fn run_jobs(comparer: &Comparer, jobs: Vec<PairJob>, parallel: bool) -> Vec<ComparisonResult> {
    use rayon::prelude::*;

    if parallel {
        return jobs
            .into_par_iter()
            .map(|job| comparer.compare_with_paths(&job.rendered, &job.golden, job.artifacts))
            .collect();
    }
    run_sequential(comparer, jobs)
}

#[cfg(not(feature = "rayon"))]
fn run_jobs(comparer: &Comparer, jobs: Vec<PairJob>, _parallel: bool) -> Vec<ComparisonResult> {
    run_sequential(comparer, jobs)
}

fn run_sequential(comparer: &Comparer, jobs: Vec<PairJob>) -> Vec<ComparisonResult> {
    jobs.into_iter()
        .map(|job| comparer.compare_with_paths(&job.rendered, &job.golden, job.artifacts))
        .collect()
}

fn ensure_dir(path: &Path) -> GoldenResult<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(GoldenError::DirectoryNotFound {
            path: path.display().to_string(),
        })
    }
}

fn list_images(dir: &Path) -> GoldenResult<Vec<PathBuf>> {
    let not_found = || GoldenError::DirectoryNotFound {
        path: dir.display().to_string(),
    };
    let entries = fs::read_dir(dir).map_err(|_| not_found())?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|_| not_found())?.path();
        if path.is_file() && is_supported_image(&path) {
            files.push(path);
        }
    }
    Ok(files)
}
