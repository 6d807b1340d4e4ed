//! Ink color representation.

use peniko::Color;
use serde::{Deserialize, Serialize};

/// Ink color (straight RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InkColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl InkColor {
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Parse `#rrggbb`, `#rrggbbaa` or `rgb(r, g, b)`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
            return match hex.len() {
                6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
                8 => Some(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
                _ => None,
            };
        }

        let inner = s.strip_prefix("rgb(")?.strip_suffix(')')?;
        let mut parts = inner.split(',').map(|p| p.trim().parse::<u8>().ok());
        let color = Self::rgb(parts.next()??, parts.next()??, parts.next()??);
        parts.next().is_none().then_some(color)
    }
}

impl Default for InkColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<Color> for InkColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self::new(rgba.r, rgba.g, rgba.b, rgba.a)
    }
}

impl From<InkColor> for Color {
    fn from(color: InkColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}
