//! # Canvas Elements
//!
//! Drawing instructions as they live in a session's log.
//!
//! Requests arrive as loosely-typed [`ElementSpec`] values (every property is
//! optional so that missing fields become validation errors instead of parse
//! failures). [`ElementSpec::validate`] turns them into a [`PendingElement`];
//! image elements additionally need their source fetched and decoded before
//! they become a loggable [`Element`].
//!
//! ## Example
//!
//! ```
//! use easel::element::{ElementSpec, PendingElement};
//!
//! let spec: ElementSpec = serde_json::from_str(
//!     r#"{"type": "rectangle", "properties": {"x": 10, "y": 10, "w": 100, "h": 50, "color": "red"}}"#,
//! ).unwrap();
//!
//! match spec.validate().unwrap() {
//!     PendingElement::Ready(element) => assert_eq!(element.kind(), "rectangle"),
//!     PendingElement::Image(_) => unreachable!(),
//! }
//! ```

mod color;
mod font;
mod spec;

pub use color::Color;
pub use font::{DEFAULT_FONT, FontSpec, MAX_FONT_SIZE};
pub use spec::{
    CircleSpec, ElementSpec, ImageSpec, MAX_IMAGE_BOX, PendingElement, PendingImage,
    RectangleSpec, TextSpec,
};

use image::RgbaImage;
use serde::Serialize;
use std::sync::Arc;

/// One drawing instruction in a session log. Immutable once appended.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Rectangle(Rectangle),
    Circle(Circle),
    Text(Text),
    Image(Picture),
}

impl Element {
    pub fn kind(&self) -> &'static str {
        match self {
            Element::Rectangle(_) => "rectangle",
            Element::Circle(_) => "circle",
            Element::Text(_) => "text",
            Element::Image(_) => "image",
        }
    }
}

/// Solid axis-aligned rectangle.
#[derive(Debug, Clone, Serialize)]
pub struct Rectangle {
    pub x: f32,
    pub y: f32,
    #[serde(rename = "w")]
    pub width: f32,
    #[serde(rename = "h")]
    pub height: f32,
    pub color: Color,
}

/// Solid disc centered on (x, y).
#[derive(Debug, Clone, Serialize)]
pub struct Circle {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub color: Color,
}

/// Single line of text; (x, y) is the left end of the baseline.
#[derive(Debug, Clone, Serialize)]
pub struct Text {
    #[serde(rename = "text")]
    pub content: String,
    pub x: f32,
    pub y: f32,
    pub font: FontSpec,
    pub color: Color,
}

/// Decoded image placed into a bounding box.
///
/// `pixels` is already scaled to the box, so replaying the element is a
/// plain blit and never goes back to the source.
#[derive(Debug, Clone, Serialize)]
pub struct Picture {
    pub x: f32,
    pub y: f32,
    #[serde(rename = "w")]
    pub width: f32,
    #[serde(rename = "h")]
    pub height: f32,
    /// Where the pixels came from (normalized URL or upload file name).
    pub source: String,
    #[serde(skip)]
    pub pixels: Arc<RgbaImage>,
}
