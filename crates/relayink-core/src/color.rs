//! Color parsing and conversion to raw RGBA8.

use peniko::Color;
use thiserror::Error;

/// Errors produced while parsing a hex color string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("Hex color must have 3 or 6 digits: {0:?}")]
    InvalidLength(String),
    #[error("Hex color contains a non-hex digit: {0:?}")]
    InvalidDigit(String),
}

/// Opaque white, the color a cleared surface is painted with.
pub const WHITE: [u8; 4] = [255, 255, 255, 255];

/// Parse a `#RGB` or `#RRGGBB` color (the `#` is optional).
///
/// Three-digit colors are expanded by doubling each digit. Anything else is
/// rejected rather than producing a garbage color.
pub fn parse_hex_color(input: &str) -> Result<Color, ColorError> {
    let trimmed = input.trim();
    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);

    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return Err(ColorError::InvalidLength(input.to_string())),
    };

    if !expanded.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ColorError::InvalidDigit(input.to_string()));
    }

    let value = u32::from_str_radix(&expanded, 16)
        .map_err(|_| ColorError::InvalidDigit(input.to_string()))?;

    Ok(Color::from_rgba8(
        (value >> 16) as u8,
        (value >> 8) as u8,
        value as u8,
        255,
    ))
}

/// Format a color as lowercase `#rrggbb`, dropping alpha.
pub fn to_hex(color: Color) -> String {
    let [r, g, b, _] = rgba8(color);
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Raw RGBA8 channels of a color.
pub fn rgba8(color: Color) -> [u8; 4] {
    let rgba = color.to_rgba8();
    [rgba.r, rgba.g, rgba.b, rgba.a]
}
