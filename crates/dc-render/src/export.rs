//! Raster and vector export of the annotation overlay.
//!
//! Raster exports are returned as `data:` URLs, the same shape a browser
//! canvas hands back, so the host can drop them straight into an `<img>`
//! or a download link.

use crate::raster::rasterize;
use crate::svg::render_svg;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use dc_core::{Color, DrawingObject};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Largest raster edge we agree to allocate, in device pixels.
pub const MAX_EXPORT_EDGE: u32 = 16_384;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("cannot export an empty canvas ({width}x{height})")]
    EmptyCanvas { width: f64, height: f64 },
    #[error("export of {width}x{height} px exceeds the {} px limit", MAX_EXPORT_EDGE)]
    TooLarge { width: u32, height: u32 },
    #[error("could not allocate a {width}x{height} px surface")]
    Allocation { width: u32, height: u32 },
    #[error("overlay SVG could not be parsed: {0}")]
    Svg(#[from] resvg::usvg::Error),
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
}

impl ExportFormat {
    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Options of a raster export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportOptions {
    pub format: ExportFormat,
    /// Encoder quality in `0.0..=1.0`; only JPEG uses it.
    pub quality: f64,
    /// Pixel multiplier applied to the canvas size.
    pub multiplier: f64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            quality: 1.0,
            multiplier: 1.0,
        }
    }
}

/// Encode the overlay as a raster image and return it as a `data:` URL.
pub fn export_raster(
    objects: &[DrawingObject],
    size: Size,
    options: &ExportOptions,
    background: Option<Color>,
) -> Result<String, ExportError> {
    let bytes = encode_raster(objects, size, options, background)?;
    Ok(format!(
        "data:{};base64,{}",
        options.format.mime(),
        STANDARD.encode(bytes)
    ))
}

/// Encode the overlay as raw PNG/JPEG bytes.
pub fn encode_raster(
    objects: &[DrawingObject],
    size: Size,
    options: &ExportOptions,
    background: Option<Color>,
) -> Result<Vec<u8>, ExportError> {
    let multiplier = if options.multiplier.is_finite() && options.multiplier > 0.0 {
        options.multiplier
    } else {
        1.0
    };
    let width = (size.width * multiplier).round();
    let height = (size.height * multiplier).round();
    if !(width >= 1.0 && height >= 1.0) {
        return Err(ExportError::EmptyCanvas {
            width: size.width,
            height: size.height,
        });
    }
    let (w, h) = (width as u32, height as u32);
    if w > MAX_EXPORT_EDGE || h > MAX_EXPORT_EDGE {
        return Err(ExportError::TooLarge { width: w, height: h });
    }

    let mut out = Vec::new();
    match options.format {
        ExportFormat::Png => {
            let img = rasterize(objects, size, w, h, multiplier, background)?;
            PngEncoder::new(&mut out).write_image(img.as_raw(), w, h, ExtendedColorType::Rgba8)?;
        }
        ExportFormat::Jpeg => {
            // JPEG has no alpha channel; flatten onto white unless told otherwise.
            let img = rasterize(objects, size, w, h, multiplier, Some(background.unwrap_or(Color::WHITE)))?;
            let rgb = DynamicImage::ImageRgba8(img).to_rgb8();
            let quality = (options.quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8;
            JpegEncoder::new_with_quality(&mut out, quality).write_image(
                rgb.as_raw(),
                w,
                h,
                ExtendedColorType::Rgb8,
            )?;
        }
    }
    log::debug!("EXPORT {w}x{h} {:?} ({} bytes)", options.format, out.len());
    Ok(out)
}

/// Standalone SVG document of the overlay.
pub fn export_svg(objects: &[DrawingObject], size: Size, background: Option<Color>) -> String {
    render_svg(objects, size, background)
}
