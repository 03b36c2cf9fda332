//! Side-by-side `[rendered | golden | amplified difference]` composite.

use crate::artifact::font::draw_label;
use crate::image::PixelGrid;
use crate::util::{GoldenError, GoldenResult};
use image::{Rgb, RgbImage};

/// Linear gain applied to the absolute difference panel.
pub const DIFF_AMPLIFICATION: u16 = 5;

const LABEL_OFFSET: u32 = 10;

/// Builds the three-panel composite, three times as wide as the inputs.
pub(crate) fn diff_composite(rendered: &PixelGrid, golden: &PixelGrid) -> GoldenResult<RgbImage> {
    rendered.ensure_same_shape(golden)?;
    let (width, height) = rendered.shape();
    let invalid = || GoldenError::InvalidDimensions { width, height };
    let w = u32::try_from(width).map_err(|_| invalid())?;
    let h = u32::try_from(height).map_err(|_| invalid())?;
    let canvas_w = w.checked_mul(3).ok_or_else(invalid)?;

    let mut canvas = RgbImage::new(canvas_w, h);
    for y in 0..height {
        let (Some(row_r), Some(row_g)) = (rendered.row(y), golden.row(y)) else {
            return Err(invalid());
        };
        for x in 0..width {
            let idx = x * 3;
            let r = [row_r[idx], row_r[idx + 1], row_r[idx + 2]];
            let g = [row_g[idx], row_g[idx + 1], row_g[idx + 2]];
            let d = [
                amplify(r[0].abs_diff(g[0])),
                amplify(r[1].abs_diff(g[1])),
                amplify(r[2].abs_diff(g[2])),
            ];
            let (px, py) = (x as u32, y as u32);
            canvas.put_pixel(px, py, Rgb(r));
            canvas.put_pixel(px + w, py, Rgb(g));
            canvas.put_pixel(px + 2 * w, py, Rgb(d));
        }
    }

    let scale = if w >= 160 { 2 } else { 1 };
    let label = format!("Difference ({DIFF_AMPLIFICATION}x)");
    draw_label(&mut canvas, LABEL_OFFSET, LABEL_OFFSET, "Rendered", scale);
    draw_label(&mut canvas, w + LABEL_OFFSET, LABEL_OFFSET, "Golden", scale);
    draw_label(&mut canvas, 2 * w + LABEL_OFFSET, LABEL_OFFSET, &label, scale);
    Ok(canvas)
}

fn amplify(diff: u8) -> u8 {
    (u16::from(diff) * DIFF_AMPLIFICATION).min(255) as u8
}

#[cfg(test)]
mod tests {
    use super::{amplify, diff_composite};
    use crate::image::PixelGrid;

    #[test]
    fn amplification_saturates() {
        assert_eq!(amplify(0), 0);
        assert_eq!(amplify(2), 10);
        assert_eq!(amplify(51), 255);
        assert_eq!(amplify(200), 255);
    }

    #[test]
    fn composite_places_panels_side_by_side() {
        let a = PixelGrid::filled(40, 30, [100, 100, 100]).unwrap();
        let b = PixelGrid::filled(40, 30, [90, 100, 120]).unwrap();
        let img = diff_composite(&a, &b).unwrap();
        assert_eq!(img.dimensions(), (120, 30));
        // Bottom-right corners are clear of the labels.
        assert_eq!(img.get_pixel(39, 29).0, [100, 100, 100]);
        assert_eq!(img.get_pixel(79, 29).0, [90, 100, 120]);
        assert_eq!(img.get_pixel(119, 29).0, [50, 0, 100]);
    }
}
