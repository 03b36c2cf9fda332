//! Structural similarity on the luma projection of two RGB grids.
//!
//! The local statistics use a 7x7 uniform window with mirrored borders
//! (`d c b a | a b c d | d c b a`) and sample covariance, `K1 = 0.01`,
//! `K2 = 0.03` and an 8-bit data range. The scalar score is the mean of the
//! map after cropping `(window - 1) / 2` pixels from every border, while the
//! map itself keeps full resolution for heatmap rendering.

use crate::image::{PixelGrid, CHANNELS};
use crate::util::{GoldenError, GoldenResult};

/// Side length of the square SSIM window.
pub const SSIM_WINDOW: usize = 7;

const K1: f64 = 0.01;
const K2: f64 = 0.03;
const DATA_RANGE: f64 = 255.0;

/// Full-resolution map of local SSIM values (1.0 = identical).
#[derive(Clone, Debug, PartialEq)]
pub struct SsimMap {
    values: Vec<f64>,
    width: usize,
    height: usize,
}

impl SsimMap {
    /// Returns the map width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the map height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the row-major map values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the local SSIM at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.values.get(y * self.width + x).copied()
    }

    /// Returns the smallest local SSIM value.
    pub fn min(&self) -> f64 {
        self.values.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

/// Projects an RGB grid onto 8-bit luma using BT.601 fixed-point weights.
///
/// `Y = (4899 R + 9617 G + 1868 B + 8192) >> 14`, rounded to an integer so
/// that the projection is exact and platform independent.
pub(crate) fn luma_plane(grid: &PixelGrid) -> Vec<f64> {
    grid.as_raw()
        .chunks_exact(CHANNELS)
        .map(|px| {
            let r = u32::from(px[0]);
            let g = u32::from(px[1]);
            let b = u32::from(px[2]);
            let y = (r * 4899 + g * 9617 + b * 1868 + 8192) >> 14;
            f64::from(y)
        })
        .collect()
}

/// Computes the global SSIM score and the full-resolution local map.
pub(crate) fn ssim(rendered: &PixelGrid, golden: &PixelGrid) -> GoldenResult<(f64, SsimMap)> {
    rendered.ensure_same_shape(golden)?;
    let (width, height) = rendered.shape();
    if width < SSIM_WINDOW || height < SSIM_WINDOW {
        return Err(GoldenError::ImageTooSmall {
            width,
            height,
            min: SSIM_WINDOW,
        });
    }

    let x = luma_plane(rendered);
    let y = luma_plane(golden);
    let xx: Vec<f64> = x.iter().map(|v| v * v).collect();
    let yy: Vec<f64> = y.iter().map(|v| v * v).collect();
    let xy: Vec<f64> = x.iter().zip(y.iter()).map(|(a, b)| a * b).collect();

    let ux = uniform_filter(&x, width, height, SSIM_WINDOW);
    let uy = uniform_filter(&y, width, height, SSIM_WINDOW);
    let uxx = uniform_filter(&xx, width, height, SSIM_WINDOW);
    let uyy = uniform_filter(&yy, width, height, SSIM_WINDOW);
    let uxy = uniform_filter(&xy, width, height, SSIM_WINDOW);

    let np = (SSIM_WINDOW * SSIM_WINDOW) as f64;
    let cov_norm = np / (np - 1.0);
    let c1 = (K1 * DATA_RANGE) * (K1 * DATA_RANGE);
    let c2 = (K2 * DATA_RANGE) * (K2 * DATA_RANGE);

    let values: Vec<f64> = (0..x.len())
        .map(|i| {
            let vx = cov_norm * (uxx[i] - ux[i] * ux[i]);
            let vy = cov_norm * (uyy[i] - uy[i] * uy[i]);
            let vxy = cov_norm * (uxy[i] - ux[i] * uy[i]);
            let a1 = 2.0 * ux[i] * uy[i] + c1;
            let a2 = 2.0 * vxy + c2;
            let b1 = ux[i] * ux[i] + uy[i] * uy[i] + c1;
            let b2 = vx + vy + c2;
            (a1 * a2) / (b1 * b2)
        })
        .collect();

    let pad = (SSIM_WINDOW - 1) / 2;
    let mut sum = 0.0f64;
    let mut count = 0usize;
    for row in pad..height - pad {
        let start = row * width;
        for value in &values[start + pad..start + width - pad] {
            sum += value;
            count += 1;
        }
    }
    let score = sum / count as f64;

    Ok((
        score,
        SsimMap {
            values,
            width,
            height,
        },
    ))
}

/// Maps an out-of-range index back into `[0, n)` by mirroring about the edges.
fn reflect(i: isize, n: usize) -> usize {
    let n = n as isize;
    let period = 2 * n;
    let mut m = i.rem_euclid(period);
    if m >= n {
        m = period - 1 - m;
    }
    m as usize
}

/// Separable box filter of odd `size` with mirrored borders.
fn uniform_filter(src: &[f64], width: usize, height: usize, size: usize) -> Vec<f64> {
    let radius = (size / 2) as isize;
    let norm = 1.0 / size as f64;

    let mut horizontal = vec![0.0f64; src.len()];
    for y in 0..height {
        let row = &src[y * width..(y + 1) * width];
        for x in 0..width {
            let mut acc = 0.0f64;
            for k in -radius..=radius {
                acc += row[reflect(x as isize + k, width)];
            }
            horizontal[y * width + x] = acc * norm;
        }
    }

    let mut out = vec![0.0f64; src.len()];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0f64;
            for k in -radius..=radius {
                acc += horizontal[reflect(y as isize + k, height) * width + x];
            }
            out[y * width + x] = acc * norm;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{luma_plane, reflect, ssim, uniform_filter};
    use crate::image::PixelGrid;
    use crate::util::GoldenError;

    #[test]
    fn reflect_mirrors_half_sample() {
        assert_eq!(reflect(-1, 5), 0);
        assert_eq!(reflect(-3, 5), 2);
        assert_eq!(reflect(5, 5), 4);
        assert_eq!(reflect(7, 5), 2);
        assert_eq!(reflect(2, 5), 2);
    }

    #[test]
    fn uniform_filter_preserves_constants() {
        let src = vec![42.0f64; 9 * 8];
        let out = uniform_filter(&src, 9, 8, 7);
        assert!(out.iter().all(|v| (v - 42.0).abs() < 1e-9));
    }

    #[test]
    fn luma_uses_bt601_weights() {
        let grid = PixelGrid::from_fn(3, 1, |x, _| match x {
            0 => [255, 0, 0],
            1 => [0, 255, 0],
            _ => [0, 0, 255],
        })
        .unwrap();
        assert_eq!(luma_plane(&grid), vec![76.0, 150.0, 29.0]);
    }

    #[test]
    fn flat_offset_stays_close_to_one() {
        let a = PixelGrid::filled(16, 16, [128, 128, 128]).unwrap();
        let b = PixelGrid::filled(16, 16, [130, 130, 130]).unwrap();
        let (score, map) = ssim(&a, &b).unwrap();
        assert!(score > 0.999 && score < 1.0);
        assert_eq!(map.width(), 16);
        assert_eq!(map.height(), 16);
    }

    #[test]
    fn rejects_images_below_window() {
        let a = PixelGrid::filled(6, 20, [0, 0, 0]).unwrap();
        let err = ssim(&a, &a).unwrap_err();
        assert_eq!(
            err,
            GoldenError::ImageTooSmall {
                width: 6,
                height: 20,
                min: 7,
            }
        );
    }
}
