//! Surface encoders
//!
//! Turns a finished surface into PNG or JPEG bytes, and from there into a
//! data URL.

use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
use image::codecs::png::PngEncoder as ImagePngEncoder;
use image::{ColorType, ImageEncoder as _};
use std::io::Cursor;

use crate::config::{OutputFormat, Options};
use crate::error::{Result, WatermarkError};
use crate::resource::data_url;
use crate::surface::Surface;

/// Trait for surface encoders
pub trait ImageEncoder: Send + Sync {
    /// The output format this encoder produces
    fn format(&self) -> OutputFormat;

    /// Encode straight-alpha RGBA pixels (4 bytes per pixel)
    ///
    /// `quality` is on the 1..=100 scale; lossless encoders ignore it.
    fn encode(&self, data: &[u8], width: u32, height: u32, quality: u8) -> Result<Vec<u8>>;
}

/// Lossless PNG, alpha preserved
pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Png
    }

    fn encode(&self, data: &[u8], width: u32, height: u32, _quality: u8) -> Result<Vec<u8>> {
        let mut output = Cursor::new(Vec::new());
        ImagePngEncoder::new(&mut output)
            .write_image(data, width, height, ColorType::Rgba8)
            .map_err(|e| WatermarkError::encode("png", e))?;
        Ok(output.into_inner())
    }
}

/// JPEG; transparent pixels are flattened over black
pub struct JpegEncoder;

impl ImageEncoder for JpegEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Jpeg
    }

    fn encode(&self, data: &[u8], width: u32, height: u32, quality: u8) -> Result<Vec<u8>> {
        let rgb_data = flatten_over_black(data);

        let mut output = Cursor::new(Vec::new());
        ImageJpegEncoder::new_with_quality(&mut output, quality.clamp(1, 100))
            .write_image(&rgb_data, width, height, ColorType::Rgb8)
            .map_err(|e| WatermarkError::encode("jpeg", e))?;
        Ok(output.into_inner())
    }
}

pub fn encoder_for(format: OutputFormat) -> Box<dyn ImageEncoder> {
    match format {
        OutputFormat::Png => Box::new(PngEncoder),
        OutputFormat::Jpeg => Box::new(JpegEncoder),
    }
}

/// Encode a surface with the output type and quality from `options`.
pub fn encode_surface(surface: &Surface, options: &Options) -> Result<Vec<u8>> {
    let format = options.output_type;
    if surface.is_empty() {
        return Err(WatermarkError::encode(
            format.as_str(),
            format!(
                "surface {} has zero area ({}x{})",
                surface.id(),
                surface.width(),
                surface.height()
            ),
        ));
    }

    encoder_for(format).encode(
        surface.image().as_raw(),
        surface.width(),
        surface.height(),
        options.jpeg_quality(),
    )
}

/// Encode a surface and wrap the bytes as `data:<type>;base64,<payload>`.
pub fn to_data_url(surface: &Surface, options: &Options) -> Result<String> {
    let bytes = encode_surface(surface, options)?;
    tracing::debug!(
        surface = %surface.id(),
        format = %options.output_type,
        bytes = bytes.len(),
        "encoded surface"
    );
    Ok(data_url::encode(&bytes, options.output_type.content_type()))
}

fn flatten_over_black(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for chunk in rgba.chunks_exact(4) {
        let alpha = u16::from(chunk[3]);
        for &channel in &chunk[..3] {
            rgb.push((u16::from(channel) * alpha / 255) as u8);
        }
    }
    rgb
}
