//! Diagnostic artifacts written for failing comparisons.
//!
//! Artifact names combine the rendered file's stem, a role suffix and the
//! rendered file's modification time in whole seconds:
//! `<stem>_diff_<mtime>.png` and `<stem>_heatmap_<mtime>.png`. Generation is
//! fallible on its own; callers fold failures into a warning and never into
//! the verdict.

pub(crate) mod diff;
pub(crate) mod font;
pub(crate) mod heatmap;

pub use diff::DIFF_AMPLIFICATION;

use crate::image::PixelGrid;
use crate::metrics::SsimMap;
use crate::trace::{trace_event, trace_span};
use crate::util::{GoldenError, GoldenResult};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Output locations of the diff composite and the heatmap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub diff: PathBuf,
    pub heatmap: PathBuf,
}

impl ArtifactPaths {
    /// Builds the artifact paths for a stem and numeric suffix.
    pub fn new(output_dir: &Path, stem: &str, suffix: u64) -> Self {
        Self {
            diff: output_dir.join(format!("{stem}_diff_{suffix}.png")),
            heatmap: output_dir.join(format!("{stem}_heatmap_{suffix}.png")),
        }
    }

    /// Derives the paths from a rendered source file's stem and mtime.
    pub fn for_source(output_dir: &Path, rendered: &Path) -> Self {
        Self::new(output_dir, &source_stem(rendered), source_suffix(rendered))
    }
}

/// Hands out artifact paths that are unique within one run.
///
/// Two sources sharing stem and mtime (for example `a.png` and `a.jpg`) get
/// successive suffixes instead of overwriting each other.
#[derive(Debug)]
pub struct ArtifactNamer {
    output_dir: PathBuf,
    claimed: HashSet<PathBuf>,
}

impl ArtifactNamer {
    /// Creates a namer rooted at `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            claimed: HashSet::new(),
        }
    }

    /// Reserves paths for `rendered`, bumping the suffix on collision.
    pub fn claim(&mut self, rendered: &Path) -> ArtifactPaths {
        let stem = source_stem(rendered);
        let mut suffix = source_suffix(rendered);
        loop {
            let paths = ArtifactPaths::new(&self.output_dir, &stem, suffix);
            if !self.claimed.contains(&paths.diff) && !self.claimed.contains(&paths.heatmap) {
                self.claimed.insert(paths.diff.clone());
                self.claimed.insert(paths.heatmap.clone());
                return paths;
            }
            suffix = suffix.wrapping_add(1);
        }
    }
}

fn source_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}

/// Modification time in whole seconds, or 0 if it cannot be read.
fn source_suffix(path: &Path) -> u64 {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Renders and saves both artifacts to `paths`, creating directories as needed.
///
/// On failure no partially written diff image is left behind.
pub fn write_artifacts(
    rendered: &PixelGrid,
    golden: &PixelGrid,
    ssim_map: &SsimMap,
    paths: &ArtifactPaths,
) -> GoldenResult<()> {
    let _guard = trace_span!("write_artifacts").entered();

    let result = write_both(rendered, golden, ssim_map, paths);
    if result.is_err() {
        let _ = fs::remove_file(&paths.diff);
    }
    result?;

    trace_event!(
        "artifacts_written",
        diff = paths.diff.display().to_string().as_str(),
        heatmap = paths.heatmap.display().to_string().as_str()
    );
    Ok(())
}

/// Generates both artifacts for `rendered_path` under `output_dir`.
pub fn generate_artifacts(
    rendered: &PixelGrid,
    golden: &PixelGrid,
    ssim_map: &SsimMap,
    output_dir: &Path,
    rendered_path: &Path,
) -> GoldenResult<ArtifactPaths> {
    let paths = ArtifactPaths::for_source(output_dir, rendered_path);
    write_artifacts(rendered, golden, ssim_map, &paths)?;
    Ok(paths)
}

fn write_both(
    rendered: &PixelGrid,
    golden: &PixelGrid,
    ssim_map: &SsimMap,
    paths: &ArtifactPaths,
) -> GoldenResult<()> {
    for path in [&paths.diff, &paths.heatmap] {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| artifact_error(parent, err))?;
        }
    }

    let composite = diff::diff_composite(rendered, golden)?;
    composite
        .save(&paths.diff)
        .map_err(|err| artifact_error(&paths.diff, err))?;

    let heatmap = heatmap::render_heatmap(ssim_map)?;
    heatmap
        .save(&paths.heatmap)
        .map_err(|err| artifact_error(&paths.heatmap, err))?;
    Ok(())
}

fn artifact_error(path: &Path, err: impl std::fmt::Display) -> GoldenError {
    GoldenError::ArtifactGeneration {
        reason: format!("{}: {err}", path.display()),
    }
}
