//! Validated background colour.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// An sRGB colour with alpha, parsed once at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }

    /// `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.is_opaque() {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Colour literal for ffmpeg filter arguments (`0xRRGGBB[AA]`).
    pub fn to_ffmpeg(&self) -> String {
        if self.is_opaque() {
            format!("0x{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("0x{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl FromStr for Color {
    type Err = ModelError;

    /// Accepts `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, the same digits
    /// prefixed with `0x`, and the names `black`, `white`, `transparent`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let invalid = |message: &str| ModelError::InvalidColor {
            input: input.to_string(),
            message: message.to_string(),
        };

        match trimmed.to_ascii_lowercase().as_str() {
            "black" => return Ok(Self::BLACK),
            "white" => return Ok(Self::WHITE),
            "transparent" => return Ok(Self::TRANSPARENT),
            _ => {}
        }

        let digits = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| invalid("expected a '#' or '0x' prefix"))?;

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid("contains non-hex characters"));
        }

        let nibble = |i: usize| u8::from_str_radix(&digits[i..i + 1], 16).map(|v| v * 17);
        let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16);

        let parsed = match digits.len() {
            3 => (nibble(0), nibble(1), nibble(2), Ok(255)),
            4 => (nibble(0), nibble(1), nibble(2), nibble(3)),
            6 => (byte(0), byte(2), byte(4), Ok(255)),
            8 => (byte(0), byte(2), byte(4), byte(6)),
            _ => return Err(invalid("expected 3, 4, 6, or 8 hex digits")),
        };

        match parsed {
            (Ok(r), Ok(g), Ok(b), Ok(a)) => Ok(Self { r, g, b, a }),
            _ => Err(invalid("contains non-hex characters")),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!("#fff".parse::<Color>().unwrap(), Color::WHITE);
        assert_eq!("#1a1a1a".parse::<Color>().unwrap(), Color::rgb(26, 26, 26));
        assert_eq!(
            "#ff000080".parse::<Color>().unwrap(),
            Color::rgba(255, 0, 0, 128)
        );
        assert_eq!("0x00FF00".parse::<Color>().unwrap(), Color::rgb(0, 255, 0));
        assert_eq!("#0f08".parse::<Color>().unwrap(), Color::rgba(0, 255, 0, 136));
        assert_eq!(" Black ".parse::<Color>().unwrap(), Color::BLACK);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("1a1a1a".parse::<Color>().is_err());
        assert!("#12345".parse::<Color>().is_err());
        assert!("#gggggg".parse::<Color>().is_err());
        assert!("#".parse::<Color>().is_err());
    }

    #[test]
    fn test_ffmpeg_literal() {
        assert_eq!(Color::rgb(26, 26, 26).to_ffmpeg(), "0x1A1A1A");
        assert_eq!(Color::rgba(255, 0, 0, 128).to_ffmpeg(), "0xFF000080");
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Color::rgb(255, 128, 0)).unwrap();
        assert_eq!(json, "\"#ff8000\"");
        let parsed: Color = serde_json::from_str("\"#ff8000\"").unwrap();
        assert_eq!(parsed, Color::rgb(255, 128, 0));
        assert!(serde_json::from_str::<Color>("\"orange\"").is_err());
    }
}
