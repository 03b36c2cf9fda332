//! Canonical in-memory pixel grids.
//!
//! Every image entering the comparison pipeline is normalized to a
//! `PixelGrid`: tightly packed 8-bit RGB triplets in row-major order with no
//! row padding. Two grids are comparable only when their shapes are equal;
//! grids are never resized to make them fit.

use crate::util::{GoldenError, GoldenResult};

pub mod io;

/// Number of interleaved channels in a `PixelGrid`.
pub const CHANNELS: usize = 3;

/// Owned RGB8 image buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelGrid {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl PixelGrid {
    /// Wraps a packed RGB8 buffer of exactly `width * height * 3` bytes.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> GoldenResult<Self> {
        let needed = required_len(width, height)?;
        if data.len() != needed {
            return Err(GoldenError::BufferLengthMismatch {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Creates a grid where every pixel has the same color.
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> GoldenResult<Self> {
        Self::from_fn(width, height, |_, _| rgb)
    }

    /// Creates a grid by evaluating `f(x, y)` for every pixel.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> GoldenResult<Self>
    where
        F: FnMut(usize, usize) -> [u8; 3],
    {
        let needed = required_len(width, height)?;
        let mut data = Vec::with_capacity(needed);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self::new(data, width, height)
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns `(width, height)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Returns the packed RGB bytes.
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Returns the pixel at `(x, y)` if it is within bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * CHANNELS;
        let px = self.data.get(idx..idx + CHANNELS)?;
        Some([px[0], px[1], px[2]])
    }

    /// Returns the packed bytes of row `y`.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let stride = self.width * CHANNELS;
        self.data.get(y * stride..(y + 1) * stride)
    }

    /// Fails with `ShapeMismatch` unless `golden` has the same dimensions.
    ///
    /// `self` is treated as the rendered image.
    pub fn ensure_same_shape(&self, golden: &PixelGrid) -> GoldenResult<()> {
        if self.shape() != golden.shape() {
            return Err(GoldenError::ShapeMismatch {
                rendered: self.shape(),
                golden: golden.shape(),
            });
        }
        Ok(())
    }
}

fn required_len(width: usize, height: usize) -> GoldenResult<usize> {
    if width == 0 || height == 0 {
        return Err(GoldenError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(CHANNELS))
        .ok_or(GoldenError::InvalidDimensions { width, height })
}
