//! Single-line text using the Spleen bitmap font.
//!
//! The requested pixel size picks the closer of the 6x12 and 12x24 Spleen
//! faces, which is then scaled with nearest neighbor so the glyph cell is
//! `size` pixels tall. The text origin is the left end of the baseline.

use image::RgbaImage;
use spleen_font::{FONT_6X12, FONT_12X24, PSF2Font};
use std::ops::Range;
use tracing::warn;

use crate::element::Text;

/// Source bitmap face metrics.
#[derive(Debug, Clone, Copy)]
struct Face {
    width: usize,
    height: usize,
    /// Rows from the top of the cell down to the baseline.
    ascent: usize,
}

const SMALL: Face = Face {
    width: 6,
    height: 12,
    ascent: 10,
};

const LARGE: Face = Face {
    width: 12,
    height: 24,
    ascent: 19,
};

fn face_for(size: f32) -> (Face, &'static [u8]) {
    if size <= 16.0 {
        (SMALL, FONT_6X12)
    } else {
        (LARGE, FONT_12X24)
    }
}

/// Glyph bitmap for `ch`, row-major, `face.width * face.height` cells.
/// Characters the font lacks come back as a box outline.
fn glyph_bitmap(font: &mut PSF2Font, face: Face, ch: char) -> Vec<bool> {
    let mut glyph = vec![false; face.width * face.height];
    let mut utf8 = [0u8; 4];

    if let Some(spleen_glyph) = font.glyph_for_utf8(ch.encode_utf8(&mut utf8).as_bytes()) {
        for (row_y, row) in spleen_glyph.enumerate() {
            for (col_x, on) in row.enumerate() {
                if row_y < face.height && col_x < face.width {
                    glyph[row_y * face.width + col_x] = on;
                }
            }
        }
    } else {
        draw_box(&mut glyph, face.width, face.height);
    }

    glyph
}

fn draw_box(glyph: &mut [bool], width: usize, height: usize) {
    for x in 0..width {
        glyph[x] = true;
        glyph[(height - 1) * width + x] = true;
    }
    for y in 0..height {
        glyph[y * width] = true;
        glyph[y * width + width - 1] = true;
    }
}

/// Width in pixels of `content` at `size`.
pub fn measure(content: &str, size: f32) -> usize {
    let (face, _) = face_for(size);
    let scale = size / face.height as f32;
    let cell_w = (face.width as f32 * scale).round().max(1.0) as usize;
    content.chars().count() * cell_w
}

/// Surface pixel range covered by a cell spanning `[start, start + len)`.
fn visible(start: f64, len: f64, limit: u32) -> Range<u32> {
    let limit = limit as f64;
    let lo = start.clamp(0.0, limit) as u32;
    let hi = (start + len).clamp(0.0, limit) as u32;
    lo..hi.max(lo)
}

/// Source bitmap index for a pixel `offset` into a scaled cell.
fn source_index(offset: f64, cell: f64, source: usize) -> usize {
    ((offset * source as f64 / cell).floor() as usize).min(source - 1)
}

/// Only the part of each glyph cell that overlaps the surface is visited, so
/// the cost is bounded by the surface area whatever the size or position.
pub fn draw_text(surface: &mut RgbaImage, text: &Text) {
    let (face, data) = face_for(text.font.size);
    let scale = text.font.size as f64 / face.height as f64;
    let cell_w = (face.width as f64 * scale).round().max(1.0);
    let cell_h = (face.height as f64 * scale).round().max(1.0);
    let top = (text.y as f64 - face.ascent as f64 * scale).round();
    let origin = (text.x as f64).round();

    let rows = visible(top, cell_h, surface.height());
    if rows.is_empty() || origin >= surface.width() as f64 {
        return;
    }

    let Ok(mut font) = PSF2Font::new(data) else {
        warn!(size = text.font.size, "Embedded font failed to load");
        return;
    };
    let color = text.color.to_rgba();

    for (index, ch) in text.content.chars().enumerate() {
        let left = origin + index as f64 * cell_w;
        if left >= surface.width() as f64 {
            break;
        }
        let cols = visible(left, cell_w, surface.width());
        if cols.is_empty() {
            continue;
        }

        let ch = if ch.is_whitespace() { ' ' } else { ch };
        let glyph = glyph_bitmap(&mut font, face, ch);

        for py in rows.clone() {
            let sy = source_index(py as f64 - top, cell_h, face.height);
            for px in cols.clone() {
                let sx = source_index(px as f64 - left, cell_w, face.width);
                if glyph[sy * face.width + sx] {
                    surface.put_pixel(px, py, color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Color, FontSpec};

    fn text(content: &str, x: f32, y: f32, size: f32) -> Text {
        Text {
            content: content.to_string(),
            x,
            y,
            font: FontSpec {
                size,
                family: "Arial".to_string(),
            },
            color: Color::rgb(0, 0, 0),
        }
    }

    fn inked(surface: &RgbaImage) -> Vec<(u32, u32)> {
        surface
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[3] == 255)
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    #[test]
    fn test_text_draws_above_baseline() {
        let mut surface = RgbaImage::new(200, 60);
        draw_text(&mut surface, &text("Hello", 10.0, 40.0, 20.0));

        let ink = inked(&surface);
        assert!(!ink.is_empty());
        // "Hello" has no descenders: ink stays near or above the baseline.
        assert!(ink.iter().all(|&(_, y)| y <= 42));
        assert!(ink.iter().all(|&(x, _)| x >= 10));
        assert!(ink.iter().any(|&(_, y)| y < 36));
    }

    #[test]
    fn test_text_width_scales_with_size() {
        assert_eq!(measure("abcd", 24.0), 48);
        assert_eq!(measure("abcd", 12.0), 24);
        assert!(measure("abcd", 48.0) > measure("abcd", 24.0));
    }

    #[test]
    fn test_small_text_uses_small_face() {
        let mut surface = RgbaImage::new(100, 30);
        draw_text(&mut surface, &text("x", 0.0, 20.0, 12.0));
        let ink = inked(&surface);
        assert!(ink.iter().all(|&(x, _)| x < 6));
    }

    #[test]
    fn test_text_off_canvas_is_clipped() {
        let mut surface = RgbaImage::new(20, 20);
        draw_text(&mut surface, &text("clipped", -500.0, -500.0, 20.0));
        assert!(inked(&surface).is_empty());
    }

    #[test]
    fn test_far_away_text_is_clipped() {
        for (x, y) in [(1e20, 10.0), (-1e20, 10.0), (0.0, 1e20), (0.0, -1e20), (f32::MAX, f32::MAX)] {
            let mut surface = RgbaImage::new(20, 20);
            draw_text(&mut surface, &text("HI", x, y, 20.0));
            assert!(inked(&surface).is_empty(), "({}, {})", x, y);
        }
    }

    #[test]
    fn test_huge_glyph_cell_only_visits_surface() {
        // Cell is 5e8 x 1e9 pixels; only the 16x16 overlap is walked.
        let size = 1e9;
        let baseline = 19.0 / 24.0 * size;
        let mut surface = RgbaImage::new(16, 16);
        draw_text(&mut surface, &text("HH", 0.0, baseline, size));
        draw_text(&mut surface, &text("HH", -3e8, baseline, f32::MAX));
        assert!(inked(&surface).len() <= 16 * 16);
    }

    #[test]
    fn test_long_line_starting_left_of_surface() {
        let mut surface = RgbaImage::new(40, 30);
        let line = "H".repeat(40);
        // First 30 cells (10px wide at size 20) fall left of the surface.
        draw_text(&mut surface, &text(&line, -300.0, 20.0, 20.0));
        assert!(!inked(&surface).is_empty());
    }

    #[test]
    fn test_space_has_no_ink() {
        let mut surface = RgbaImage::new(50, 50);
        draw_text(&mut surface, &text("   ", 0.0, 30.0, 20.0));
        assert!(inked(&surface).is_empty());
    }
}
