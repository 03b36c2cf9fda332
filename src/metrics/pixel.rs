//! Pixel-level error statistics over the full RGB difference.

use crate::image::PixelGrid;

/// Mean squared error, maximum channel difference and normalized RMSE.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelStats {
    /// Mean of squared per-channel differences.
    pub mse: f64,
    /// Largest absolute per-channel difference (0-255).
    pub max_channel_diff: u8,
    /// `sqrt(mse) / 255`.
    pub rmse_normalized: f64,
}

/// Computes pixel statistics for two grids of identical shape.
///
/// Callers must check shapes first; the byte buffers are compared pairwise.
pub(crate) fn pixel_stats(rendered: &PixelGrid, golden: &PixelGrid) -> PixelStats {
    let a = rendered.as_raw();
    let b = golden.as_raw();
    let mut sum_sq = 0.0f64;
    let mut max_diff = 0u8;
    for (&va, &vb) in a.iter().zip(b.iter()) {
        let diff = va.abs_diff(vb);
        max_diff = max_diff.max(diff);
        let d = f64::from(diff);
        sum_sq += d * d;
    }
    let mse = if a.is_empty() {
        0.0
    } else {
        sum_sq / a.len() as f64
    };
    PixelStats {
        mse,
        max_channel_diff: max_diff,
        rmse_normalized: mse.sqrt() / 255.0,
    }
}

#[cfg(test)]
mod tests {
    use super::pixel_stats;
    use crate::image::PixelGrid;

    #[test]
    fn single_channel_offset_contributes_one_third() {
        let a = PixelGrid::filled(4, 4, [10, 10, 10]).unwrap();
        let b = PixelGrid::filled(4, 4, [13, 10, 10]).unwrap();
        let stats = pixel_stats(&a, &b);
        assert_eq!(stats.max_channel_diff, 3);
        assert!((stats.mse - 3.0).abs() < 1e-12);
        assert!((stats.rmse_normalized - 3.0f64.sqrt() / 255.0).abs() < 1e-12);
    }

    #[test]
    fn difference_is_symmetric() {
        let a = PixelGrid::from_fn(8, 8, |x, y| [(x * 30) as u8, (y * 20) as u8, 7]).unwrap();
        let b = PixelGrid::filled(8, 8, [100, 50, 200]).unwrap();
        assert_eq!(pixel_stats(&a, &b), pixel_stats(&b, &a));
    }
}
