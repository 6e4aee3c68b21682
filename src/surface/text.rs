//! Text measurement and rasterization.
//!
//! Fonts are caller-supplied TrueType/OpenType data at a pixel size; glyphs
//! are laid out left to right with kerning and blended onto the target.

use ab_glyph::{Font as _, FontArc, GlyphId, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::blend::blend_pixel_at;
use crate::error::{Result, WatermarkError};

/// A parsed font at a pixel size.
#[derive(Clone)]
pub struct Font {
    font: FontArc,
    size: f32,
}

impl fmt::Debug for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Font").field("size", &self.size).finish()
    }
}

impl Font {
    pub fn from_bytes(data: Vec<u8>, size: f32) -> Result<Self> {
        let font = FontArc::try_from_vec(data).map_err(|e| WatermarkError::Font(e.to_string()))?;
        Ok(Self { font, size })
    }

    pub fn from_file(path: impl AsRef<Path>, size: f32) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| WatermarkError::Font(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(data, size)
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    /// Same face at another size; the font data is shared.
    pub fn with_size(&self, size: f32) -> Self {
        Self {
            font: self.font.clone(),
            size,
        }
    }

    fn scale(&self) -> PxScale {
        PxScale::from(self.size)
    }
}

/// Horizontal extent and vertical metrics of a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextMetrics {
    pub width: f32,
    /// Distance from the baseline to the top of the em box (positive).
    pub ascent: f32,
    /// Distance from the baseline to the bottom of the em box (negative).
    pub descent: f32,
}

/// Straight-alpha RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    pub const fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

impl FromStr for Color {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self> {
        parse_hex_color(s)
    }
}

/// Parse a hex color string.
///
/// Supports #RGB, #RRGGBB and #RRGGBBAA.
///
/// # Examples
///
/// ```
/// use watermark::surface::text::{parse_hex_color, Color};
///
/// assert_eq!(parse_hex_color("#FFF").unwrap(), Color::white());
/// assert_eq!(parse_hex_color("#FF000080").unwrap(), Color::rgba(255, 0, 0, 128));
/// ```
pub fn parse_hex_color(hex: &str) -> Result<Color> {
    let digits = hex
        .strip_prefix('#')
        .ok_or_else(|| WatermarkError::Config("Color must start with '#'".to_string()))?;

    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(WatermarkError::Config(format!("Invalid hex color: {}", hex)));
    }

    let channel = |range: std::ops::Range<usize>| -> Result<u8> {
        u8::from_str_radix(&digits[range], 16)
            .map_err(|_| WatermarkError::Config(format!("Invalid hex color: {}", hex)))
    };

    match digits.len() {
        3 => {
            // Double each digit: 0xF -> 0xFF
            let r = channel(0..1)?;
            let g = channel(1..2)?;
            let b = channel(2..3)?;
            Ok(Color::rgb(r * 17, g * 17, b * 17))
        }
        6 => Ok(Color::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        8 => Ok(Color::rgba(
            channel(0..2)?,
            channel(2..4)?,
            channel(4..6)?,
            channel(6..8)?,
        )),
        n => Err(WatermarkError::Config(format!(
            "Color must be #RGB, #RRGGBB or #RRGGBBAA, got {} digits",
            n
        ))),
    }
}

/// Measure `text` set in `font`.
pub fn measure(font: &Font, text: &str) -> TextMetrics {
    let scaled = font.font.as_scaled(font.scale());

    let mut width = 0.0f32;
    let mut prev_glyph: Option<GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled.glyph_id(c);
        if let Some(prev) = prev_glyph {
            width += scaled.kern(prev, glyph_id);
        }
        width += scaled.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    TextMetrics {
        width,
        ascent: scaled.ascent(),
        descent: scaled.descent(),
    }
}

/// Rasterize `text` with its left edge at `x` and its alphabetic baseline at `baseline`.
pub(crate) fn fill(
    target: &mut RgbaImage,
    font: &Font,
    text: &str,
    x: f32,
    baseline: f32,
    color: Color,
    opacity: f32,
) {
    let scale = font.scale();
    let scaled = font.font.as_scaled(scale);
    let alpha = color.a as f32 * opacity.clamp(0.0, 1.0);

    let mut cursor_x = x;
    let mut prev_glyph: Option<GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled.glyph_id(c);
        if let Some(prev) = prev_glyph {
            cursor_x += scaled.kern(prev, glyph_id);
        }

        let glyph = glyph_id.with_scale_and_position(scale, ab_glyph::point(cursor_x, baseline));

        if let Some(outlined) = font.font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                let px_x = (bounds.min.x as i32).saturating_add(px as i32);
                let px_y = (bounds.min.y as i32).saturating_add(py as i32);
                let pixel = Rgba([color.r, color.g, color.b, (coverage * alpha) as u8]);
                blend_pixel_at(target, px_x, px_y, pixel);
            });
        }

        cursor_x += scaled.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }
}

/// DejaVu Sans, bundled for tests that need real glyphs.
#[cfg(test)]
const TEST_FONT_DATA: &[u8] = include_bytes!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/fonts/DejaVuSans.ttf"
));

#[cfg(test)]
pub(crate) fn test_font(size: f32) -> Font {
    Font::from_bytes(TEST_FONT_DATA.to_vec(), size).expect("bundled test font parses")
}
