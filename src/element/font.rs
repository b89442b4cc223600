//! Canvas font descriptors (`"20px Arial"`).

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::EaselError;

pub const DEFAULT_FONT: &str = "20px Arial";

/// Largest accepted font size, in pixels.
pub const MAX_FONT_SIZE: f32 = 1000.0;

/// Font size and family parsed from a canvas-style descriptor.
///
/// Leading style keywords (`bold`, `italic`, `normal`) are accepted and
/// dropped. The family is kept for display only; glyphs always come from the
/// embedded bitmap font.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub size: f32,
    pub family: String,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            size: 20.0,
            family: "Arial".to_string(),
        }
    }
}

impl FontSpec {
    pub fn parse_or_default(value: Option<&str>) -> Result<Self, EaselError> {
        match value.map(str::trim) {
            None | Some("") => Ok(FontSpec::default()),
            Some(s) => s.parse(),
        }
    }
}

impl FromStr for FontSpec {
    type Err = EaselError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |why: &str| EaselError::validation(format!("Invalid font '{}': {}", s, why));

        let mut tokens = s.split_whitespace();
        let size_token = tokens
            .by_ref()
            .find(|t| !matches!(t.to_ascii_lowercase().as_str(), "bold" | "italic" | "normal"))
            .ok_or_else(|| invalid("missing size"))?;

        let size: f32 = size_token
            .strip_suffix("px")
            .ok_or_else(|| invalid("size must be given in px"))?
            .parse()
            .map_err(|_| invalid("size is not a number"))?;
        if !size.is_finite() || size <= 0.0 {
            return Err(invalid("size must be greater than 0"));
        }
        if size > MAX_FONT_SIZE {
            return Err(invalid(&format!("size must be at most {}px", MAX_FONT_SIZE)));
        }

        let family = tokens.collect::<Vec<_>>().join(" ");
        let family = if family.is_empty() {
            FontSpec::default().family
        } else {
            family
        };

        Ok(FontSpec { size, family })
    }
}

impl fmt::Display for FontSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px {}", self.size, self.family)
    }
}

impl Serialize for FontSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
