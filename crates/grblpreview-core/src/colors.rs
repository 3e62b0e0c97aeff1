//! Preview colour scheme.

use serde::{Deserialize, Serialize};
use tiny_skia::Color;

/// Straight (non-premultiplied) RGBA colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn to_color(self) -> Color {
        Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

/// Colours used by the machine preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorScheme {
    /// Panel background
    pub preview_back: Rgba,
    /// Crosshair at the current tool position
    pub preview_cross: Rgba,
    /// Status text block
    pub preview_text: Rgba,
    /// Cutting / engraving moves
    pub preview_path: Rgba,
    /// Rapid (G0) moves
    pub preview_rapid: Rgba,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::dark()
    }
}

impl ColorScheme {
    pub fn dark() -> Self {
        Self {
            preview_back: Rgba::opaque(52, 73, 94),
            preview_cross: Rgba::opaque(255, 255, 0),
            preview_text: Rgba::opaque(236, 240, 241),
            preview_path: Rgba::opaque(52, 152, 219),
            preview_rapid: Rgba::new(149, 165, 166, 160),
        }
    }

    pub fn light() -> Self {
        Self {
            preview_back: Rgba::opaque(255, 255, 255),
            preview_cross: Rgba::opaque(220, 20, 60),
            preview_text: Rgba::opaque(30, 30, 30),
            preview_path: Rgba::opaque(0, 0, 0),
            preview_rapid: Rgba::new(128, 128, 128, 160),
        }
    }

    /// Look up a built-in scheme by name (case-insensitive)
    pub fn named(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Self::dark()),
            "light" => Some(Self::light()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_schemes() {
        assert_eq!(ColorScheme::named("Dark"), Some(ColorScheme::dark()));
        assert_eq!(ColorScheme::named(" light "), Some(ColorScheme::light()));
        assert_eq!(ColorScheme::named("solarized"), None);
    }

    #[test]
    fn test_scheme_serialization() {
        let json = serde_json::to_string(&ColorScheme::light()).unwrap();
        let back: ColorScheme = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ColorScheme::light());
    }
}
