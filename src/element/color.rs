//! Fill colors.
//!
//! Accepts the color strings a browser color picker or a hand-written request
//! would send: `#rgb`, `#rrggbb`, `rgb(r, g, b)` and a table of CSS names.
//! Every accepted color is opaque.

use image::Rgba;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::EaselError;

/// An opaque RGB fill color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("green", [0, 128, 0]),
    ("lime", [0, 255, 0]),
    ("blue", [0, 0, 255]),
    ("yellow", [255, 255, 0]),
    ("cyan", [0, 255, 255]),
    ("aqua", [0, 255, 255]),
    ("magenta", [255, 0, 255]),
    ("fuchsia", [255, 0, 255]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
    ("silver", [192, 192, 192]),
    ("maroon", [128, 0, 0]),
    ("olive", [128, 128, 0]),
    ("navy", [0, 0, 128]),
    ("purple", [128, 0, 128]),
    ("teal", [0, 128, 128]),
    ("orange", [255, 165, 0]),
    ("pink", [255, 192, 203]),
    ("brown", [165, 42, 42]),
];

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse an optional color field. Absent or blank means black.
    pub fn parse_or_black(value: Option<&str>) -> Result<Self, EaselError> {
        match value.map(str::trim) {
            None | Some("") => Ok(Color::BLACK),
            Some(s) => s.parse(),
        }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 255])
    }
}

impl FromStr for Color {
    type Err = EaselError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let invalid = || EaselError::validation(format!("Invalid color '{}'", s.trim()));

        if let Some(hex) = lower.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(invalid);
        }

        if let Some(args) = lower
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let channels: Vec<u8> = args
                .split(',')
                .map(|c| c.trim().parse::<u8>())
                .collect::<Result<_, _>>()
                .map_err(|_| invalid())?;
            return match channels[..] {
                [r, g, b] => Ok(Color::rgb(r, g, b)),
                _ => Err(invalid()),
            };
        }

        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, [r, g, b])| Color::rgb(*r, *g, *b))
            .ok_or_else(invalid)
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let mut digits = hex.chars().filter_map(|c| c.to_digit(16));
            let mut next = || digits.next().map(|d| (d * 17) as u8);
            Some(Color::rgb(next()?, next()?, next()?))
        }
        6 => {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
        }
        _ => None,
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_colors() {
        assert_eq!("red".parse::<Color>().unwrap(), Color::rgb(255, 0, 0));
        assert_eq!(" Blue ".parse::<Color>().unwrap(), Color::rgb(0, 0, 255));
        assert_eq!("grey".parse::<Color>().unwrap(), "gray".parse().unwrap());
    }

    #[test]
    fn test_hex_colors() {
        assert_eq!("#ff8000".parse::<Color>().unwrap(), Color::rgb(255, 128, 0));
        assert_eq!("#F80".parse::<Color>().unwrap(), Color::rgb(255, 136, 0));
        assert!("#ff80".parse::<Color>().is_err());
        assert!("#gg0000".parse::<Color>().is_err());
    }

    #[test]
    fn test_rgb_function() {
        assert_eq!(
            "rgb(10, 20, 30)".parse::<Color>().unwrap(),
            Color::rgb(10, 20, 30)
        );
        assert!("rgb(10, 20)".parse::<Color>().is_err());
        assert!("rgb(300, 0, 0)".parse::<Color>().is_err());
    }

    #[test]
    fn test_default_is_black() {
        assert_eq!(Color::parse_or_black(None).unwrap(), Color::BLACK);
        assert_eq!(Color::parse_or_black(Some("  ")).unwrap(), Color::BLACK);
    }

    #[test]
    fn test_unknown_color_is_validation_error() {
        let err = "chartreuse-ish".parse::<Color>().unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_display_is_hex() {
        assert_eq!(Color::rgb(255, 0, 16).to_string(), "#ff0010");
    }
}
