//! Pure Rust image backend on the `image` crate.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP, GIF, BMP, TIFF) | `image::load_from_memory_with_format` |
//! | Decode, unknown declared type | `image::load_from_memory` (format sniffed) |
//! | Bitmap resize | `DynamicImage::resize_exact` |
//! | Draw | `crop_imm` + `imageops::resize` + `imageops::overlay` |
//! | Encode → PNG | `PngEncoder` |
//! | Encode → JPEG | `JpegEncoder::new_with_quality` (alpha dropped) |
//! | Encode → WebP | `WebPEncoder::new_lossless` (quality ignored) |
//! | Encode → AVIF | `AvifEncoder` (rav1e, speed 6) |

use super::backend::{BackendError, ImageBackend};
use super::calculations::DrawRect;
use super::params::{OutputFormat, Quality, ResampleQuality, SmoothingQuality};
use super::surface::{Bitmap, Canvas, DecodedSurface};
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat};

/// Encoders we know how to drive, paired with the `image` format whose
/// feature flag must be compiled in.
fn output_candidates() -> [(OutputFormat, ImageFormat); 4] {
    [
        (OutputFormat::Png, ImageFormat::Png),
        (OutputFormat::Jpeg, ImageFormat::Jpeg),
        (OutputFormat::WebP, ImageFormat::WebP),
        (OutputFormat::Avif, ImageFormat::Avif),
    ]
}

/// AVIF encoder speed (1 = slowest/best, 10 = fastest).
const AVIF_SPEED: u8 = 6;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Decoder for a declared MIME type, if one is compiled in.
///
/// AVIF is excluded: the `"avif"` feature only enables the encoder, even
/// though `reading_enabled()` reports otherwise.
fn input_format(declared_type: &str) -> Option<ImageFormat> {
    ImageFormat::from_mime_type(declared_type)
        .filter(|fmt| *fmt != ImageFormat::Avif && fmt.reading_enabled())
}

/// Filter used when a draw scales between differing rectangle sizes.
fn draw_filter(canvas: &Canvas) -> FilterType {
    if !canvas.smoothing() {
        return FilterType::Nearest;
    }
    match canvas.smoothing_quality().unwrap_or(SmoothingQuality::Low) {
        SmoothingQuality::Low => FilterType::Triangle,
        SmoothingQuality::Medium => FilterType::CatmullRom,
        SmoothingQuality::High => FilterType::Lanczos3,
    }
}

fn resample_filter(quality: ResampleQuality) -> FilterType {
    match quality {
        ResampleQuality::Off | ResampleQuality::Pixelated => FilterType::Nearest,
        ResampleQuality::Low => FilterType::Triangle,
        ResampleQuality::Medium => FilterType::CatmullRom,
        ResampleQuality::High => FilterType::Lanczos3,
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8], declared_type: &str) -> Result<DecodedSurface, BackendError> {
        match input_format(declared_type) {
            Some(format) => image::load_from_memory_with_format(bytes, format)
                .map(|img| DecodedSurface::Bitmap(Bitmap::new(img)))
                .map_err(|e| BackendError::Decode(format!("Failed to decode {declared_type}: {e}"))),
            // No native decoder for the declared type: sniff the content instead
            None => image::load_from_memory(bytes)
                .map(DecodedSurface::Fallback)
                .map_err(|e| BackendError::Decode(format!("Failed to decode image: {e}"))),
        }
    }

    fn make_surface(&self, width: u32, height: u32) -> Result<Canvas, BackendError> {
        Canvas::allocate(width, height)
    }

    fn draw(
        &self,
        target: &mut Canvas,
        source: &DecodedSurface,
        rect: &DrawRect,
    ) -> Result<(), BackendError> {
        if rect.is_empty() {
            return Ok(());
        }

        let region = source
            .image()
            .crop_imm(rect.sx, rect.sy, rect.sw, rect.sh)
            .to_rgba8();
        let scaled = if (rect.sw, rect.sh) == (rect.dw, rect.dh) {
            region
        } else {
            imageops::resize(&region, rect.dw, rect.dh, draw_filter(target))
        };

        imageops::overlay(target.pixels_mut(), &scaled, rect.dx as i64, rect.dy as i64);
        Ok(())
    }

    fn encode(
        &self,
        target: &Canvas,
        format: &OutputFormat,
        quality: Option<Quality>,
    ) -> Result<Vec<u8>, BackendError> {
        let (width, height) = target.dimensions();
        let percent = quality.unwrap_or_default().percent();
        let rgba = target.pixels().as_raw();
        let mut buf = Vec::new();

        let written = match format {
            OutputFormat::Png => {
                PngEncoder::new(&mut buf).write_image(rgba, width, height, ExtendedColorType::Rgba8)
            }
            OutputFormat::Jpeg => {
                let rgb = DynamicImage::ImageRgba8(target.pixels().clone()).to_rgb8();
                JpegEncoder::new_with_quality(&mut buf, percent).write_image(
                    rgb.as_raw(),
                    width,
                    height,
                    ExtendedColorType::Rgb8,
                )
            }
            OutputFormat::WebP => WebPEncoder::new_lossless(&mut buf).write_image(
                rgba,
                width,
                height,
                ExtendedColorType::Rgba8,
            ),
            OutputFormat::Avif => AvifEncoder::new_with_speed_quality(&mut buf, AVIF_SPEED, percent)
                .write_image(rgba, width, height, ExtendedColorType::Rgba8),
            OutputFormat::Other(mime) => {
                return Err(BackendError::Encode(format!(
                    "Unsupported output type: {mime}"
                )));
            }
        };

        written.map_err(|e| BackendError::Encode(format!("{} encode failed: {e}", format.mime())))?;
        if buf.is_empty() {
            return Err(BackendError::Encode(format!(
                "{} encoder produced no output",
                format.mime()
            )));
        }
        Ok(buf)
    }

    fn supported_formats(&self) -> Vec<OutputFormat> {
        output_candidates()
            .into_iter()
            .filter(|(_, fmt)| fmt.writing_enabled())
            .map(|(output, _)| output)
            .collect()
    }

    fn supports_bitmap_resize(&self) -> bool {
        true
    }

    fn resize_bitmap(
        &self,
        bitmap: &Bitmap,
        width: u32,
        height: u32,
        quality: ResampleQuality,
    ) -> Result<Bitmap, BackendError> {
        let resized = bitmap
            .image()
            .resize_exact(width, height, resample_filter(quality));
        Ok(Bitmap::new(resized))
    }

    fn supports_smoothing_quality(&self) -> bool {
        true
    }
}
