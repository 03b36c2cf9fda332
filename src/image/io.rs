//! Decoding image files into `PixelGrid`s via the `image` crate.

use crate::image::PixelGrid;
use crate::util::{GoldenError, GoldenResult};
use std::path::Path;

/// Converts any decoded image into the canonical RGB8 grid.
///
/// Alpha is discarded, grayscale is replicated across channels and 16-bit or
/// float sources are scaled down to 8 bits.
pub fn grid_from_dynamic_image(img: &::image::DynamicImage) -> GoldenResult<PixelGrid> {
    let rgb = img.to_rgb8();
    let width = rgb.width() as usize;
    let height = rgb.height() as usize;
    PixelGrid::new(rgb.into_raw(), width, height)
}

/// Loads an image from disk and converts it to a `PixelGrid`.
///
/// Missing, unreadable and undecodable files all map to `GoldenError::Load`.
pub fn load_pixel_grid<P: AsRef<Path>>(path: P) -> GoldenResult<PixelGrid> {
    let path = path.as_ref();
    let img = ::image::open(path).map_err(|err| GoldenError::Load {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    grid_from_dynamic_image(&img).map_err(|err| GoldenError::Load {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
}

/// Returns true when the file extension names a format whose decoder is
/// compiled in, so batch enumeration never pairs files `load_pixel_grid`
/// cannot open.
pub fn is_supported_image(path: &Path) -> bool {
    ::image::ImageFormat::from_path(path)
        .map(|format| format.reading_enabled())
        .unwrap_or(false)
}
