//! Rebuilding a session surface from its element log.
//!
//! The surface is never painted on directly: every append goes through a
//! [`ReplayEngine`], which receives the committed log and the element about
//! to be committed and leaves the surface equal to the render of both.

use image::RgbaImage;

use super::{clear, draw};
use crate::element::Element;

/// Strategy for bringing a surface up to date with `log + [next]`.
///
/// Implementations must leave the surface pixel-identical to
/// [`super::render_log`] over the same elements.
pub trait ReplayEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, surface: &mut RgbaImage, log: &[Element], next: &Element);
}

/// Clears the surface and redraws the whole log in append order, then the
/// new element. O(n) per append.
#[derive(Debug, Default, Clone, Copy)]
pub struct FullReplay;

impl ReplayEngine for FullReplay {
    fn name(&self) -> &'static str {
        "full"
    }

    fn apply(&self, surface: &mut RgbaImage, log: &[Element], next: &Element) {
        clear(surface);
        for element in log {
            draw(surface, element);
        }
        draw(surface, next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Circle, Color, Rectangle};
    use crate::render::render_log;

    fn rect(x: f32, color: Color) -> Element {
        Element::Rectangle(Rectangle {
            x,
            y: 0.0,
            width: 10.0,
            height: 10.0,
            color,
        })
    }

    #[test]
    fn test_replay_matches_render_of_full_log() {
        let log = vec![
            rect(0.0, Color::rgb(255, 0, 0)),
            Element::Circle(Circle {
                x: 8.0,
                y: 5.0,
                radius: 4.0,
                color: Color::rgb(0, 0, 255),
            }),
        ];
        let next = rect(5.0, Color::rgb(0, 255, 0));

        // Start from garbage to prove the surface is cleared first.
        let mut surface = RgbaImage::from_pixel(20, 10, image::Rgba([9, 9, 9, 255]));
        FullReplay.apply(&mut surface, &log, &next);

        let mut all = log.clone();
        all.push(next);
        assert_eq!(surface, render_log(20, 10, &all));
    }

    #[test]
    fn test_last_write_wins() {
        let mut surface = RgbaImage::new(20, 10);
        let log = vec![rect(0.0, Color::rgb(255, 0, 0))];
        FullReplay.apply(&mut surface, &log, &rect(0.0, Color::rgb(0, 0, 255)));
        assert_eq!(surface.get_pixel(5, 5).0, [0, 0, 255, 255]);
    }
}
