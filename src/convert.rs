//! Conversion items and the per-item conversion pipeline.
//!
//! Each [`ConversionItem`] moves through `ready → converting → done | error`.
//! A conversion decodes the source, resolves the target size from the
//! *decoded* dimensions, prepares a canvas (background fill for encodings
//! without alpha, transparent otherwise), optionally resamples fast-path
//! bitmaps, performs one composite draw, and encodes the canvas.
//!
//! ## Failure isolation
//!
//! Every failure between decode and encode, including a panic inside the
//! backend, ends the item in `error` with a display string and never escapes
//! [`convert_item`]. A failed run leaves the artifact of an earlier
//! successful run in place until the next success replaces it.
//!
//! ## Output names
//!
//! ```text
//! photo.jpg      + image/webp → photo.webp
//! my:photo?.jpg  + image/png  → my_photo_.png
//! scan.tiff      + image/x-foo → scan.img
//! ```

use crate::imaging::{
    BackendError, ConversionOptions, DecodedSurface, ImageBackend, OutputFormat,
    calculate_draw_rect, resample, resolve_dimensions,
};
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

/// Characters that are replaced with `_` in derived output filenames.
const UNSAFE_FILENAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

pub type ItemId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Ready,
    Converting,
    Done,
    Error,
}

impl ItemStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

/// Encoded source image as ingested.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    /// Declared MIME type, e.g. `image/jpeg`.
    pub mime_type: String,
    pub size: u64,
    /// Display name, usually the original file name.
    pub name: String,
}

impl SourceImage {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            size: bytes.len() as u64,
            bytes,
            mime_type: mime_type.into(),
            name: name.into(),
        }
    }
}

/// Result of a successful conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputArtifact {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub filename: String,
    pub size: u64,
    /// Dimensions actually produced.
    pub width: u32,
    pub height: u32,
}

/// One source image and its conversion state.
#[derive(Debug, Clone)]
pub struct ConversionItem {
    id: ItemId,
    source: SourceImage,
    source_dimensions: Option<(u32, u32)>,
    status: ItemStatus,
    error: Option<String>,
    output: Option<OutputArtifact>,
}

impl ConversionItem {
    pub fn new(id: ItemId, source: SourceImage) -> Self {
        Self {
            id,
            source,
            source_dimensions: None,
            status: ItemStatus::Ready,
            error: None,
            output: None,
        }
    }

    /// Attach dimensions known before decoding (e.g. from a header probe).
    pub fn with_dimensions(mut self, dimensions: Option<(u32, u32)>) -> Self {
        self.source_dimensions = dimensions;
        self
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    /// Source pixel size. Authoritative once a decode has succeeded.
    pub fn source_dimensions(&self) -> Option<(u32, u32)> {
        self.source_dimensions
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    /// Error text; only present in [`ItemStatus::Error`].
    pub fn error(&self) -> Option<&str> {
        match self.status {
            ItemStatus::Error => self.error.as_deref(),
            _ => None,
        }
    }

    /// Artifact of the current run; only present in [`ItemStatus::Done`].
    pub fn output(&self) -> Option<&OutputArtifact> {
        match self.status {
            ItemStatus::Done => self.output.as_ref(),
            _ => None,
        }
    }

    /// Artifact of the most recent successful run, whatever the status now.
    pub fn last_output(&self) -> Option<&OutputArtifact> {
        self.output.as_ref()
    }
}

/// Derive the output filename: display name without extension, unsafe
/// characters replaced with `_`, plus the canonical extension for `format`.
pub fn output_filename(name: &str, format: &OutputFormat) -> String {
    let stem = match name.rfind('.') {
        Some(dot) if dot > 0 && !name[dot..].contains(['/', '\\']) => &name[..dot],
        _ => name,
    };
    let sanitized: String = stem
        .chars()
        .map(|c| if UNSAFE_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect();
    format!("{}.{}", sanitized, format.extension())
}

/// Turn a panic payload into display text. String payloads are kept verbatim.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "conversion panicked".to_string()
    }
}

/// Convert one item with `options`, recording the outcome on the item.
///
/// A request for an item that is already converting is ignored. Returns the
/// item's status afterwards.
pub fn convert_item(
    backend: &impl ImageBackend,
    item: &mut ConversionItem,
    options: &ConversionOptions,
) -> ItemStatus {
    if item.status == ItemStatus::Converting {
        debug!(item = item.id, "already converting, ignoring request");
        return item.status;
    }

    item.status = ItemStatus::Converting;
    item.error = None;
    debug!(item = item.id, name = %item.source.name, target = %options.format, "converting");

    let source = &item.source;
    let dimensions = &mut item.source_dimensions;
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        run_pipeline(backend, source, dimensions, options)
    }))
    .unwrap_or_else(|payload| Err(BackendError::Unspecified(panic_message(payload.as_ref()))));

    match outcome {
        Ok(artifact) => {
            debug!(
                item = item.id,
                output = %artifact.filename,
                width = artifact.width,
                height = artifact.height,
                size = artifact.size,
                "converted"
            );
            item.output = Some(artifact);
            item.status = ItemStatus::Done;
        }
        Err(e) => {
            warn!(item = item.id, name = %item.source.name, kind = e.kind(), error = %e, "conversion failed");
            item.error = Some(e.to_string());
            item.status = ItemStatus::Error;
        }
    }
    item.status
}

/// Decode → size → canvas → (resample) → draw → encode.
///
/// `source_dimensions` is updated as soon as the decode succeeds, so it is
/// accurate even if a later step fails.
fn run_pipeline(
    backend: &impl ImageBackend,
    source: &SourceImage,
    source_dimensions: &mut Option<(u32, u32)>,
    options: &ConversionOptions,
) -> Result<OutputArtifact, BackendError> {
    let decoded = backend.decode(&source.bytes, &source.mime_type)?;
    let decoded_size = decoded.dimensions();
    *source_dimensions = Some(decoded_size);

    let (width, height) = resolve_dimensions(decoded_size, &options.resize);

    let mut canvas = backend.make_surface(width, height)?;
    // Must happen before any drawing
    if options.format.supports_alpha() {
        canvas.clear();
    } else {
        canvas.fill(options.background);
    }

    canvas.set_smoothing(options.smoothing);
    if options.smoothing && backend.supports_smoothing_quality() {
        canvas.set_smoothing_quality(options.smoothing_quality);
    }

    let surface = match decoded {
        DecodedSurface::Bitmap(bitmap) => DecodedSurface::Bitmap(resample::resample(
            backend,
            bitmap,
            (width, height),
            options.fit,
            options.resample_quality,
        )?),
        fallback => fallback,
    };

    let rect = calculate_draw_rect(surface.dimensions(), (width, height), options.fit);
    backend.draw(&mut canvas, &surface, &rect)?;
    // Releases the bitmap, if any, before the encode
    drop(surface);

    let quality = options
        .format
        .accepts_quality()
        .then_some(options.quality);
    let bytes = backend.encode(&canvas, &options.format, quality)?;

    Ok(OutputArtifact {
        size: bytes.len() as u64,
        bytes,
        mime_type: options.format.mime().to_string(),
        filename: output_filename(&source.name, &options.format),
        width,
        height,
    })
}
