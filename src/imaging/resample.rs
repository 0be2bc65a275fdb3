//! Optional pre-draw resize of fast-path bitmaps.
//!
//! A native resize to the exact target size can antialias better than a
//! draw-time scale. It only applies when the draw is a plain resize:
//! `contain` and `cover` decide their scale and crop at draw time.
//! Skipping it always yields a valid (possibly softer) result.

use super::backend::{BackendError, ImageBackend};
use super::params::{Fit, ResampleQuality};
use super::surface::Bitmap;
use tracing::debug;

/// Whether a bitmap of `source` size should be resized to `target` before drawing.
pub fn should_resample(
    backend: &impl ImageBackend,
    source: (u32, u32),
    target: (u32, u32),
    fit: Fit,
    quality: ResampleQuality,
) -> bool {
    backend.supports_bitmap_resize()
        && quality != ResampleQuality::Off
        && !matches!(fit, Fit::Contain | Fit::Cover)
        && source != target
}

/// Resize `bitmap` to `target` when [`should_resample`] allows it.
///
/// Takes ownership: on success the original is released and the resized
/// bitmap returned. When skipped, the original comes back unchanged. A
/// failed backend resize is an error; the original is released on drop.
pub fn resample(
    backend: &impl ImageBackend,
    bitmap: Bitmap,
    target: (u32, u32),
    fit: Fit,
    quality: ResampleQuality,
) -> Result<Bitmap, BackendError> {
    let source = bitmap.dimensions();
    if !should_resample(backend, source, target, fit, quality) {
        return Ok(bitmap);
    }

    let resized = backend.resize_bitmap(&bitmap, target.0, target.1, quality)?;
    debug!(
        from = ?source,
        to = ?resized.dimensions(),
        ?quality,
        "resampled bitmap before draw"
    );
    bitmap.close();
    Ok(resized)
}
