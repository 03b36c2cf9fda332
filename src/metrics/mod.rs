//! Metric computation for a rendered/golden pair.
//!
//! `compute_metrics` is deterministic: the same input bytes always produce
//! bit-identical scores and maps.

pub(crate) mod pixel;
pub(crate) mod ssim;

pub use ssim::{SsimMap, SSIM_WINDOW};

use crate::image::PixelGrid;
use crate::trace::{trace_event, trace_span};
use crate::util::GoldenResult;

/// Scalar similarity metrics for one comparison.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Metrics {
    /// Global structural similarity (1.0 = identical).
    pub ssim: f64,
    /// Mean squared per-channel error.
    pub mse: f64,
    /// Largest absolute per-channel difference.
    pub max_channel_diff: u8,
    /// Root mean squared error divided by 255.
    pub rmse_normalized: f64,
}

impl Metrics {
    /// Worst-case values reported when a pair could not be measured.
    pub const SENTINEL: Metrics = Metrics {
        ssim: 0.0,
        mse: f64::INFINITY,
        max_channel_diff: 255,
        rmse_normalized: 1.0,
    };
}

/// Scalar metrics together with the local SSIM map.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricSet {
    pub metrics: Metrics,
    pub ssim_map: SsimMap,
}

/// Computes SSIM, the SSIM map and pixel statistics for two grids.
///
/// Fails with `ShapeMismatch` when dimensions differ and `ImageTooSmall` when
/// either side is below the SSIM window.
pub fn compute_metrics(rendered: &PixelGrid, golden: &PixelGrid) -> GoldenResult<MetricSet> {
    let _guard = trace_span!(
        "compute_metrics",
        width = rendered.width(),
        height = rendered.height()
    )
    .entered();

    let (ssim_score, ssim_map) = ssim::ssim(rendered, golden)?;
    let stats = pixel::pixel_stats(rendered, golden);

    trace_event!(
        "metrics",
        ssim = ssim_score,
        mse = stats.mse,
        max_channel_diff = stats.max_channel_diff
    );

    Ok(MetricSet {
        metrics: Metrics {
            ssim: ssim_score,
            mse: stats.mse,
            max_channel_diff: stats.max_channel_diff,
            rmse_normalized: stats.rmse_normalized,
        },
        ssim_map,
    })
}
