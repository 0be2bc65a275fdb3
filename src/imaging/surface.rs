//! Decoded sources and draw targets.
//!
//! A decode produces a [`DecodedSurface`]: either a fast-path [`Bitmap`],
//! which owns a release hook that runs exactly once when the bitmap is
//! dropped, or a fallback image with nothing to release. Pipeline code only
//! looks at the variant where resampling and release are decided.
//!
//! A [`Canvas`] is the draw target for one conversion. It is never shared
//! between conversions.

use super::backend::BackendError;
use super::params::{Background, SmoothingQuality};
use image::{DynamicImage, Rgba, RgbaImage};
use std::fmt;

/// Largest canvas area we are willing to allocate (16384 x 16384).
pub const MAX_CANVAS_PIXELS: u64 = 16_384 * 16_384;

type ReleaseHook = Box<dyn FnOnce() + Send>;

/// Fast-path decoded image.
///
/// Owned by exactly one pipeline run. Dropping it (or calling
/// [`Bitmap::close`]) releases it; the release hook cannot run twice.
pub struct Bitmap {
    image: DynamicImage,
    release: Option<ReleaseHook>,
}

impl Bitmap {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image,
            release: None,
        }
    }

    /// A bitmap whose release is observable, e.g. to hand memory back to a
    /// pool or to count releases in tests.
    pub fn with_release_hook(image: DynamicImage, hook: impl FnOnce() + Send + 'static) -> Self {
        Self {
            image,
            release: Some(Box::new(hook)),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Release the bitmap now.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for Bitmap {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("dimensions", &self.dimensions())
            .field("releasable", &self.release.is_some())
            .finish()
    }
}

/// Result of decoding a source image.
#[derive(Debug)]
pub enum DecodedSurface {
    /// Native bitmap: supports pre-draw resampling, released on drop.
    Bitmap(Bitmap),
    /// Generic drawable image with nothing to release.
    Fallback(DynamicImage),
}

impl DecodedSurface {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Bitmap(bitmap) => bitmap.dimensions(),
            Self::Fallback(image) => (image.width(), image.height()),
        }
    }

    pub fn image(&self) -> &DynamicImage {
        match self {
            Self::Bitmap(bitmap) => bitmap.image(),
            Self::Fallback(image) => image,
        }
    }

    pub fn is_bitmap(&self) -> bool {
        matches!(self, Self::Bitmap(_))
    }
}

/// Draw target: RGBA pixels plus the smoothing state used by draws.
#[derive(Debug, Clone)]
pub struct Canvas {
    pixels: RgbaImage,
    smoothing: bool,
    smoothing_quality: Option<SmoothingQuality>,
}

impl Canvas {
    /// Allocate a transparent canvas.
    ///
    /// Fails with [`BackendError::SurfaceUnavailable`] for empty or oversized
    /// dimensions.
    pub fn allocate(width: u32, height: u32) -> Result<Self, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::SurfaceUnavailable(format!(
                "Cannot create a {width}x{height} canvas"
            )));
        }
        if width as u64 * height as u64 > MAX_CANVAS_PIXELS {
            return Err(BackendError::SurfaceUnavailable(format!(
                "Canvas {width}x{height} exceeds the {MAX_CANVAS_PIXELS} pixel limit"
            )));
        }
        Ok(Self {
            pixels: RgbaImage::new(width, height),
            smoothing: true,
            smoothing_quality: None,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Paint every pixel with `background`.
    pub fn fill(&mut self, background: Background) {
        let color = Rgba(background.rgba());
        self.pixels.pixels_mut().for_each(|p| *p = color);
    }

    /// Reset every pixel to fully transparent.
    pub fn clear(&mut self) {
        self.pixels.pixels_mut().for_each(|p| *p = Rgba([0, 0, 0, 0]));
    }

    pub fn set_smoothing(&mut self, enabled: bool) {
        self.smoothing = enabled;
    }

    pub fn smoothing(&self) -> bool {
        self.smoothing
    }

    pub fn set_smoothing_quality(&mut self, quality: SmoothingQuality) {
        self.smoothing_quality = Some(quality);
    }

    /// `None` until a quality is set; backends pick their own default then.
    pub fn smoothing_quality(&self) -> Option<SmoothingQuality> {
        self.smoothing_quality
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }
}
