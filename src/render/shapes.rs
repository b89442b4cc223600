//! Solid shapes and image blits.
//!
//! A pixel belongs to a shape when its center lies inside it. Covered pixels
//! are overwritten with the fill color, so overlapping shapes resolve to
//! whichever was drawn last.

use image::{RgbaImage, imageops};

use crate::element::{Circle, Picture, Rectangle};

/// Pixel index range `[lo, hi)` whose centers fall in `[start, end)`,
/// clamped to `0..limit`.
fn covered_span(start: f32, end: f32, limit: u32) -> (u32, u32) {
    let clamp = |v: f32| v.clamp(0.0, limit as f32) as u32;
    let lo = clamp((start - 0.5).ceil());
    let hi = clamp((end - 0.5).ceil());
    (lo, hi.max(lo))
}

pub fn fill_rect(surface: &mut RgbaImage, rect: &Rectangle) {
    let color = rect.color.to_rgba();
    let (x0, x1) = covered_span(rect.x, rect.x + rect.width, surface.width());
    let (y0, y1) = covered_span(rect.y, rect.y + rect.height, surface.height());

    for y in y0..y1 {
        for x in x0..x1 {
            surface.put_pixel(x, y, color);
        }
    }
}

/// Full 0..2π disc.
pub fn fill_circle(surface: &mut RgbaImage, circle: &Circle) {
    let color = circle.color.to_rgba();
    let r2 = circle.radius * circle.radius;
    let (x0, x1) = covered_span(
        circle.x - circle.radius,
        circle.x + circle.radius + 1.0,
        surface.width(),
    );
    let (y0, y1) = covered_span(
        circle.y - circle.radius,
        circle.y + circle.radius + 1.0,
        surface.height(),
    );

    for y in y0..y1 {
        let dy = y as f32 + 0.5 - circle.y;
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - circle.x;
            if dx * dx + dy * dy <= r2 {
                surface.put_pixel(x, y, color);
            }
        }
    }
}

/// Composite pre-scaled image pixels at the element's rounded origin.
pub fn draw_picture(surface: &mut RgbaImage, picture: &Picture) {
    let x = picture.x.round();
    let y = picture.y.round();
    let outside = x >= surface.width() as f32
        || y >= surface.height() as f32
        || x + picture.pixels.width() as f32 <= 0.0
        || y + picture.pixels.height() as f32 <= 0.0;
    if outside {
        return;
    }
    imageops::overlay(surface, picture.pixels.as_ref(), x as i64, y as i64);
}
