//! # Rendering Module
//!
//! Pure functions that paint [`Element`]s onto an RGBA surface.
//!
//! ## Modules
//!
//! - [`shapes`]: solid rectangles, discs and image blits
//! - [`text`]: single-line text from the embedded Spleen bitmap font
//! - [`replay`]: rebuilding a surface from an element log
//!
//! Nothing here fails: coordinates outside the surface are clipped, and image
//! elements carry their pixels already decoded.
//!
//! ## Usage Example
//!
//! ```
//! use easel::element::{Circle, Color, Element};
//! use easel::render;
//!
//! let log = vec![Element::Circle(Circle {
//!     x: 50.0,
//!     y: 50.0,
//!     radius: 20.0,
//!     color: Color::rgb(0, 0, 255),
//! })];
//!
//! let surface = render::render_log(100, 100, &log);
//! assert_eq!(surface.get_pixel(50, 50).0, [0, 0, 255, 255]);
//! ```

pub mod replay;
pub mod shapes;
pub mod text;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage, imageops::FilterType};
use std::io::Cursor;

use crate::element::Element;
use crate::error::EaselError;

/// A freshly cleared surface pixel.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Paint one element onto the surface.
pub fn draw(surface: &mut RgbaImage, element: &Element) {
    match element {
        Element::Rectangle(r) => shapes::fill_rect(surface, r),
        Element::Circle(c) => shapes::fill_circle(surface, c),
        Element::Text(t) => text::draw_text(surface, t),
        Element::Image(p) => shapes::draw_picture(surface, p),
    }
}

/// Reset every pixel to transparent.
pub fn clear(surface: &mut RgbaImage) {
    for pixel in surface.pixels_mut() {
        *pixel = TRANSPARENT;
    }
}

/// Render a whole log onto a new surface.
pub fn render_log(width: u32, height: u32, log: &[Element]) -> RgbaImage {
    let mut surface = RgbaImage::new(width, height);
    for element in log {
        draw(&mut surface, element);
    }
    surface
}

/// Scale a decoded image to exactly fill a bounding box.
///
/// Aspect ratio is not preserved. Fractional sizes round to the nearest
/// pixel, with a minimum of one.
pub fn fit_to_box(image: &DynamicImage, width: f32, height: f32) -> RgbaImage {
    let w = width.round().max(1.0) as u32;
    let h = height.round().max(1.0) as u32;
    image.resize_exact(w, h, FilterType::Triangle).to_rgba8()
}

/// Encode a surface as PNG.
pub fn to_png(surface: &RgbaImage) -> Result<Vec<u8>, EaselError> {
    let mut png_bytes = Vec::new();
    surface
        .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| EaselError::Export(format!("PNG encoding failed: {}", e)))?;
    Ok(png_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_fit_to_box_ignores_aspect_ratio() {
        let source = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(40, 10, Rgb([9, 9, 9])));
        let fitted = fit_to_box(&source, 20.0, 30.4);
        assert_eq!(fitted.dimensions(), (20, 30));
    }

    #[test]
    fn test_clear_makes_surface_transparent() {
        let mut surface = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]));
        clear(&mut surface);
        assert!(surface.pixels().all(|p| *p == TRANSPARENT));
    }

    #[test]
    fn test_png_roundtrip_dimensions() {
        let surface = RgbaImage::new(7, 5);
        let png = to_png(&surface).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (7, 5));
    }
}
