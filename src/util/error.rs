//! Error types for goldencmp.

use thiserror::Error;

/// Result alias for goldencmp operations.
pub type GoldenResult<T> = std::result::Result<T, GoldenError>;

/// Errors that can occur while comparing renders against golden images.
///
/// Reasons from underlying libraries are stored as strings so the enum stays
/// `Clone + PartialEq`.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GoldenError {
    /// The image file is missing, unreadable, or cannot be decoded.
    #[error("failed to load image {path}: {reason}")]
    Load { path: String, reason: String },
    /// Rendered and golden images do not share the same dimensions.
    #[error(
        "image shape mismatch: rendered {}x{} vs golden {}x{}",
        rendered.0, rendered.1, golden.0, golden.1
    )]
    ShapeMismatch {
        rendered: (usize, usize),
        golden: (usize, usize),
    },
    /// The image is smaller than the SSIM window.
    #[error("image {width}x{height} is smaller than the {min}x{min} SSIM window")]
    ImageTooSmall {
        width: usize,
        height: usize,
        min: usize,
    },
    /// Width or height is zero or overflows the address space.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Pixel buffer length does not match the declared dimensions.
    #[error("buffer length mismatch: needed {needed}, got {got}")]
    BufferLengthMismatch { needed: usize, got: usize },
    /// Writing the diff composite or heatmap failed.
    #[error("artifact generation failed: {reason}")]
    ArtifactGeneration { reason: String },
    /// A batch input directory does not exist.
    #[error("directory {path} does not exist or cannot be read")]
    DirectoryNotFound { path: String },
    /// The JSON summary could not be serialized or written.
    #[error("failed to write report: {reason}")]
    Report { reason: String },
}

impl GoldenError {
    /// Returns true for errors that only affect a single rendered/golden pair.
    ///
    /// These degrade into a failing comparison instead of aborting a batch.
    pub fn is_per_pair(&self) -> bool {
        matches!(
            self,
            GoldenError::Load { .. }
                | GoldenError::ShapeMismatch { .. }
                | GoldenError::ImageTooSmall { .. }
        )
    }
}
