//! Colorized rendering of the local SSIM map with a legend.
//!
//! Values are clamped to `[0, 1]` and mapped through the red-yellow-blue
//! diverging scale: red marks dissimilar regions, blue marks similar ones.

use crate::artifact::font::{draw_text, text_height, text_width};
use crate::metrics::SsimMap;
use crate::util::{GoldenError, GoldenResult};
use image::{Rgb, RgbImage};

const MIN_LONG_SIDE: usize = 256;
const MARGIN: u32 = 16;
const BAR_GAP: u32 = 16;
const BAR_WIDTH: u32 = 16;
const TICK_GAP: u32 = 6;
const MIN_BAR_HEIGHT: u32 = 64;
const TITLE: &str = "SSIM (1.0 = identical)";
const TITLE_SCALE: u32 = 2;
const TICKS: [(f64, &str); 3] = [(1.0, "1.0"), (0.5, "0.5"), (0.0, "0.0")];

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Maps a similarity value onto the diverging color scale.
pub(crate) fn similarity_color(value: f64) -> Rgb<u8> {
    let t = if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    };
    let c = colorous::RED_YELLOW_BLUE.eval_continuous(t);
    Rgb([c.r, c.g, c.b])
}

/// Integer upscale factor that brings the longest side to at least 256 px.
fn upscale_factor(width: usize, height: usize) -> usize {
    let long = width.max(height).max(1);
    MIN_LONG_SIDE.div_ceil(long).max(1)
}

/// Renders the heatmap canvas: title, scaled map and a labelled color bar.
pub(crate) fn render_heatmap(map: &SsimMap) -> GoldenResult<RgbImage> {
    let (width, height) = (map.width(), map.height());
    let invalid = || GoldenError::InvalidDimensions { width, height };
    let scale = upscale_factor(width, height);
    let map_w = u32::try_from(width * scale).map_err(|_| invalid())?;
    let map_h = u32::try_from(height * scale).map_err(|_| invalid())?;

    let title_h = text_height(TITLE_SCALE) + MARGIN;
    let bar_h = map_h.max(MIN_BAR_HEIGHT);
    let tick_w = TICKS
        .iter()
        .map(|(_, label)| text_width(label, 1))
        .max()
        .unwrap_or(0);
    let body_w = map_w + BAR_GAP + BAR_WIDTH + TICK_GAP + tick_w;
    let canvas_w = MARGIN * 2 + body_w.max(text_width(TITLE, TITLE_SCALE));
    let canvas_h = MARGIN * 2 + title_h + bar_h;

    let mut canvas = RgbImage::from_pixel(canvas_w, canvas_h, WHITE);
    draw_text(&mut canvas, MARGIN, MARGIN, TITLE, BLACK, TITLE_SCALE);

    let top = MARGIN + title_h;
    for py in 0..map_h {
        let sy = py as usize / scale;
        for px in 0..map_w {
            let sx = px as usize / scale;
            let value = map.get(sx, sy).ok_or_else(invalid)?;
            canvas.put_pixel(MARGIN + px, top + py, similarity_color(value));
        }
    }

    let bar_x = MARGIN + map_w + BAR_GAP;
    let span = f64::from(bar_h.saturating_sub(1).max(1));
    for j in 0..bar_h {
        let color = similarity_color(1.0 - f64::from(j) / span);
        for i in 0..BAR_WIDTH {
            canvas.put_pixel(bar_x + i, top + j, color);
        }
    }
    outline(&mut canvas, bar_x, top, BAR_WIDTH, bar_h);

    let label_x = bar_x + BAR_WIDTH + TICK_GAP;
    let glyph_h = text_height(1);
    for (value, label) in TICKS {
        let center = top + ((1.0 - value) * span).round() as u32;
        let label_y = center
            .saturating_sub(glyph_h / 2)
            .clamp(top, top + bar_h - glyph_h);
        draw_text(&mut canvas, label_x, label_y, label, BLACK, 1);
    }

    Ok(canvas)
}

fn outline(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32) {
    for i in 0..w {
        img.put_pixel(x + i, y, BLACK);
        img.put_pixel(x + i, y + h - 1, BLACK);
    }
    for j in 0..h {
        img.put_pixel(x, y + j, BLACK);
        img.put_pixel(x + w - 1, y + j, BLACK);
    }
}

#[cfg(test)]
mod tests {
    use super::{similarity_color, upscale_factor};

    #[test]
    fn endpoints_use_distinct_hues() {
        let low = similarity_color(0.0);
        let high = similarity_color(1.0);
        assert!(low.0[0] > low.0[2], "low similarity should be red");
        assert!(high.0[2] > high.0[0], "high similarity should be blue");
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        assert_eq!(similarity_color(-0.4), similarity_color(0.0));
        assert_eq!(similarity_color(1.7), similarity_color(1.0));
        assert_eq!(similarity_color(f64::NAN), similarity_color(0.0));
    }

    #[test]
    fn small_maps_are_upscaled() {
        assert_eq!(upscale_factor(64, 64), 4);
        assert_eq!(upscale_factor(100, 40), 3);
        assert_eq!(upscale_factor(1024, 768), 1);
    }
}
