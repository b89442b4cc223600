//! Request-side element descriptions and their validation.

use serde::Deserialize;
use std::collections::HashMap;

use super::{Circle, Color, Element, FontSpec, Rectangle, Text};
use crate::error::EaselError;
use crate::fetch::{ImageSource, UploadedFile};

/// Largest accepted image bounding box side, in pixels.
///
/// Scaled pictures stay in the element log as RGBA, so one image costs up to
/// 4096 * 4096 * 4 bytes (64 MiB) for the life of its canvas.
pub const MAX_IMAGE_BOX: f32 = 4096.0;

/// An element as submitted by a client: `{"type": ..., "properties": {...}}`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "properties", rename_all = "lowercase")]
pub enum ElementSpec {
    #[serde(alias = "rect")]
    Rectangle(RectangleSpec),
    Circle(CircleSpec),
    Text(TextSpec),
    Image(ImageSpec),
}

#[derive(Debug, Default, Deserialize)]
pub struct RectangleSpec {
    pub x: Option<f32>,
    pub y: Option<f32>,
    #[serde(alias = "width")]
    pub w: Option<f32>,
    #[serde(alias = "height")]
    pub h: Option<f32>,
    pub color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CircleSpec {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub radius: Option<f32>,
    pub color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TextSpec {
    pub text: Option<String>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub font: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImageSpec {
    #[serde(alias = "imageUrl", alias = "src")]
    pub url: Option<String>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    #[serde(alias = "width")]
    pub w: Option<f32>,
    #[serde(alias = "height")]
    pub h: Option<f32>,
    /// Uploaded file; takes precedence over `url`.
    #[serde(skip)]
    pub upload: Option<UploadedFile>,
}

/// A validated element that may still need its image resolved.
#[derive(Debug)]
pub enum PendingElement {
    Ready(Element),
    Image(PendingImage),
}

/// Validated image placement whose pixels are not loaded yet.
#[derive(Debug)]
pub struct PendingImage {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub source: ImageSource,
}

impl ElementSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            ElementSpec::Rectangle(_) => "rectangle",
            ElementSpec::Circle(_) => "circle",
            ElementSpec::Text(_) => "text",
            ElementSpec::Image(_) => "image",
        }
    }

    /// Check required fields and parse colors and fonts.
    pub fn validate(self) -> Result<PendingElement, EaselError> {
        match self {
            ElementSpec::Rectangle(r) => Ok(PendingElement::Ready(Element::Rectangle(Rectangle {
                x: coordinate(r.x, "x")?,
                y: coordinate(r.y, "y")?,
                width: positive(r.w, "w")?,
                height: positive(r.h, "h")?,
                color: Color::parse_or_black(r.color.as_deref())?,
            }))),
            ElementSpec::Circle(c) => Ok(PendingElement::Ready(Element::Circle(Circle {
                x: coordinate(c.x, "x")?,
                y: coordinate(c.y, "y")?,
                radius: positive(c.radius, "radius")?,
                color: Color::parse_or_black(c.color.as_deref())?,
            }))),
            ElementSpec::Text(t) => {
                let content = t
                    .text
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| EaselError::validation("Text content cannot be empty"))?;
                Ok(PendingElement::Ready(Element::Text(Text {
                    content,
                    x: coordinate(t.x, "x")?,
                    y: coordinate(t.y, "y")?,
                    font: FontSpec::parse_or_default(t.font.as_deref())?,
                    color: Color::parse_or_black(t.color.as_deref())?,
                })))
            }
            ElementSpec::Image(i) => {
                let x = coordinate(i.x, "x")?;
                let y = coordinate(i.y, "y")?;
                let width = positive(i.w, "w")?;
                let height = positive(i.h, "h")?;
                if width > MAX_IMAGE_BOX || height > MAX_IMAGE_BOX {
                    return Err(EaselError::validation(format!(
                        "Image box must be at most {} pixels per side",
                        MAX_IMAGE_BOX
                    )));
                }
                let source = match (i.upload, i.url) {
                    (Some(upload), _) => ImageSource::Upload(upload),
                    (None, Some(url)) if !url.trim().is_empty() => ImageSource::Url(url),
                    _ => return Err(EaselError::validation("No image URL provided")),
                };
                Ok(PendingElement::Image(PendingImage {
                    x,
                    y,
                    width,
                    height,
                    source,
                }))
            }
        }
    }

    /// Build a spec from flat form fields (multipart requests).
    ///
    /// Numeric fields arrive as strings; unparseable numbers are validation
    /// errors rather than silently missing.
    pub fn from_fields(
        kind: &str,
        fields: &HashMap<String, String>,
        upload: Option<UploadedFile>,
    ) -> Result<Self, EaselError> {
        let text = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| fields.get(*k))
                .filter(|v| !v.is_empty())
                .cloned()
        };

        let spec = match kind.trim().to_ascii_lowercase().as_str() {
            "rectangle" | "rect" => ElementSpec::Rectangle(RectangleSpec {
                x: number(fields, &["x"])?,
                y: number(fields, &["y"])?,
                w: number(fields, &["w", "width"])?,
                h: number(fields, &["h", "height"])?,
                color: text(&["color"]),
            }),
            "circle" => ElementSpec::Circle(CircleSpec {
                x: number(fields, &["x"])?,
                y: number(fields, &["y"])?,
                radius: number(fields, &["radius"])?,
                color: text(&["color"]),
            }),
            "text" => ElementSpec::Text(TextSpec {
                text: text(&["text"]),
                x: number(fields, &["x"])?,
                y: number(fields, &["y"])?,
                font: text(&["font"]),
                color: text(&["color"]),
            }),
            "image" => ElementSpec::Image(ImageSpec {
                url: text(&["url", "imageUrl", "src"]),
                x: number(fields, &["x"])?,
                y: number(fields, &["y"])?,
                w: number(fields, &["w", "width"])?,
                h: number(fields, &["h", "height"])?,
                upload,
            }),
            "" => return Err(EaselError::validation("Missing element type")),
            other => {
                return Err(EaselError::validation(format!(
                    "Unknown element type '{}'",
                    other
                )));
            }
        };
        Ok(spec)
    }
}

fn coordinate(value: Option<f32>, name: &str) -> Result<f32, EaselError> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(_) => Err(EaselError::validation(format!("'{}' must be a finite number", name))),
        None => Err(EaselError::validation(format!("Missing '{}'", name))),
    }
}

fn positive(value: Option<f32>, name: &str) -> Result<f32, EaselError> {
    let v = coordinate(value, name)?;
    if v <= 0.0 {
        return Err(EaselError::validation(format!(
            "'{}' must be greater than 0",
            name
        )));
    }
    Ok(v)
}

fn number(fields: &HashMap<String, String>, keys: &[&str]) -> Result<Option<f32>, EaselError> {
    let Some((key, raw)) = keys
        .iter()
        .find_map(|k| fields.get(*k).map(|v| (*k, v.trim())))
    else {
        return Ok(None);
    };
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f32>()
        .map(Some)
        .map_err(|_| EaselError::validation(format!("'{}' is not a number: '{}'", key, raw)))
}
