//! Image backend trait and error taxonomy.
//!
//! The [`ImageBackend`] trait is the boundary between conversion logic and
//! pixel work. The pipeline decides geometry and order; the backend decodes,
//! allocates canvases, draws, and encodes.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate.

use super::calculations::DrawRect;
use super::params::{OutputFormat, Quality, ResampleQuality};
use super::surface::{Bitmap, Canvas, DecodedSurface};
use thiserror::Error;

/// Failure of a single conversion step.
///
/// `Display` is the bare message so it can be shown as an item's error text
/// verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Source bytes are unreadable, corrupt, or in an unsupported format.
    #[error("{0}")]
    Decode(String),
    /// A draw target could not be created.
    #[error("{0}")]
    SurfaceUnavailable(String),
    /// The encoder rejected the type/quality or produced no output.
    #[error("{0}")]
    Encode(String),
    /// Anything else, including panics inside a backend.
    #[error("{0}")]
    Unspecified(String),
}

impl BackendError {
    /// Short name of the failure class, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::SurfaceUnavailable(_) => "surface",
            Self::Encode(_) => "encode",
            Self::Unspecified(_) => "unspecified",
        }
    }
}

/// Trait for image backends.
///
/// `Sync` so one backend can serve every worker of a batch.
pub trait ImageBackend: Sync {
    /// Decode raw bytes into a drawable surface.
    fn decode(&self, bytes: &[u8], declared_type: &str) -> Result<DecodedSurface, BackendError>;

    /// Allocate a blank, transparent draw target.
    fn make_surface(&self, width: u32, height: u32) -> Result<Canvas, BackendError>;

    /// Composite `rect`'s source region of `source` into its destination
    /// region of `target`, honoring the canvas smoothing settings.
    fn draw(
        &self,
        target: &mut Canvas,
        source: &DecodedSurface,
        rect: &DrawRect,
    ) -> Result<(), BackendError>;

    /// Serialize the canvas. `quality` is `None` for encodings that take none.
    fn encode(
        &self,
        target: &Canvas,
        format: &OutputFormat,
        quality: Option<Quality>,
    ) -> Result<Vec<u8>, BackendError>;

    /// Output formats this backend can encode.
    fn supported_formats(&self) -> Vec<OutputFormat>;

    /// Whether [`ImageBackend::resize_bitmap`] is available.
    fn supports_bitmap_resize(&self) -> bool {
        false
    }

    /// Native resize of a fast-path bitmap to exact dimensions.
    fn resize_bitmap(
        &self,
        _bitmap: &Bitmap,
        _width: u32,
        _height: u32,
        _quality: ResampleQuality,
    ) -> Result<Bitmap, BackendError> {
        Err(BackendError::Unspecified(
            "Bitmap resize is not supported by this backend".into(),
        ))
    }

    /// Whether draws honor [`Canvas::smoothing_quality`].
    fn supports_smoothing_quality(&self) -> bool {
        false
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use image::DynamicImage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Pipeline step at which a [`MockBackend`] misbehaves.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Stage {
        Decode,
        Surface,
        Resize,
        Draw,
        Encode,
    }

    /// How a [`MockBackend`] misbehaves.
    #[derive(Debug, Clone)]
    pub enum Fault {
        Fail(BackendError),
        PanicText(&'static str),
        PanicNumber(u32),
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode {
            declared_type: String,
        },
        MakeSurface {
            width: u32,
            height: u32,
        },
        ResizeBitmap {
            width: u32,
            height: u32,
            quality: ResampleQuality,
        },
        Draw {
            rect: DrawRect,
            source_is_bitmap: bool,
            smoothing: bool,
            smoothing_quality: Option<crate::imaging::SmoothingQuality>,
            /// Top-left canvas pixel at draw time.
            corner: [u8; 4],
        },
        Encode {
            format: OutputFormat,
            quality: Option<Quality>,
            width: u32,
            height: u32,
        },
    }

    /// Mock backend that records operations instead of doing pixel work.
    ///
    /// Decodes every input to a blank image of the configured size. Uses
    /// Mutex (not RefCell) so it is Sync and works across batch workers.
    pub struct MockBackend {
        pub source_dimensions: (u32, u32),
        pub fast_bitmaps: bool,
        pub bitmap_resize: bool,
        pub smoothing_quality: bool,
        pub fault: Option<(Stage, Fault)>,
        pub operations: Mutex<Vec<RecordedOp>>,
        pub created: AtomicUsize,
        pub releases: Arc<AtomicUsize>,
    }

    impl Default for MockBackend {
        fn default() -> Self {
            Self {
                source_dimensions: (40, 20),
                fast_bitmaps: true,
                bitmap_resize: false,
                smoothing_quality: false,
                fault: None,
                operations: Mutex::new(Vec::new()),
                created: AtomicUsize::new(0),
                releases: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(width: u32, height: u32) -> Self {
            Self {
                source_dimensions: (width, height),
                ..Self::default()
            }
        }

        /// Decode to fallback surfaces instead of bitmaps.
        pub fn fallback(mut self) -> Self {
            self.fast_bitmaps = false;
            self
        }

        pub fn with_bitmap_resize(mut self) -> Self {
            self.bitmap_resize = true;
            self
        }

        pub fn with_smoothing_quality(mut self) -> Self {
            self.smoothing_quality = true;
            self
        }

        pub fn faulting_at(mut self, stage: Stage, fault: Fault) -> Self {
            self.fault = Some((stage, fault));
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        /// Number of bitmaps handed out (decoded or resized).
        pub fn bitmaps_created(&self) -> usize {
            self.created.load(Ordering::SeqCst)
        }

        pub fn release_count(&self) -> usize {
            self.releases.load(Ordering::SeqCst)
        }

        fn record(&self, op: RecordedOp) {
            self.operations.lock().unwrap().push(op);
        }

        fn check(&self, stage: Stage) -> Result<(), BackendError> {
            match &self.fault {
                Some((at, fault)) if *at == stage => match fault {
                    Fault::Fail(err) => Err(err.clone()),
                    Fault::PanicText(text) => panic!("{}", text),
                    Fault::PanicNumber(n) => std::panic::panic_any(*n),
                },
                _ => Ok(()),
            }
        }

        fn bitmap(&self, image: DynamicImage) -> Bitmap {
            self.created.fetch_add(1, Ordering::SeqCst);
            let releases = Arc::clone(&self.releases);
            Bitmap::with_release_hook(image, move || {
                releases.fetch_add(1, Ordering::SeqCst);
            })
        }
    }

    impl ImageBackend for MockBackend {
        fn decode(
            &self,
            _bytes: &[u8],
            declared_type: &str,
        ) -> Result<DecodedSurface, BackendError> {
            self.record(RecordedOp::Decode {
                declared_type: declared_type.to_string(),
            });
            self.check(Stage::Decode)?;
            let (w, h) = self.source_dimensions;
            let image = DynamicImage::new_rgba8(w, h);
            Ok(if self.fast_bitmaps {
                DecodedSurface::Bitmap(self.bitmap(image))
            } else {
                DecodedSurface::Fallback(image)
            })
        }

        fn make_surface(&self, width: u32, height: u32) -> Result<Canvas, BackendError> {
            self.record(RecordedOp::MakeSurface { width, height });
            self.check(Stage::Surface)?;
            Canvas::allocate(width, height)
        }

        fn draw(
            &self,
            target: &mut Canvas,
            source: &DecodedSurface,
            rect: &DrawRect,
        ) -> Result<(), BackendError> {
            self.record(RecordedOp::Draw {
                rect: *rect,
                source_is_bitmap: source.is_bitmap(),
                smoothing: target.smoothing(),
                smoothing_quality: target.smoothing_quality(),
                corner: target.pixels().get_pixel(0, 0).0,
            });
            self.check(Stage::Draw)
        }

        fn encode(
            &self,
            target: &Canvas,
            format: &OutputFormat,
            quality: Option<Quality>,
        ) -> Result<Vec<u8>, BackendError> {
            self.record(RecordedOp::Encode {
                format: format.clone(),
                quality,
                width: target.width(),
                height: target.height(),
            });
            self.check(Stage::Encode)?;
            Ok(vec![0xAB; 16])
        }

        fn supported_formats(&self) -> Vec<OutputFormat> {
            vec![OutputFormat::Png, OutputFormat::Jpeg]
        }

        fn supports_bitmap_resize(&self) -> bool {
            self.bitmap_resize
        }

        fn resize_bitmap(
            &self,
            _bitmap: &Bitmap,
            width: u32,
            height: u32,
            quality: ResampleQuality,
        ) -> Result<Bitmap, BackendError> {
            self.record(RecordedOp::ResizeBitmap {
                width,
                height,
                quality,
            });
            self.check(Stage::Resize)?;
            Ok(self.bitmap(DynamicImage::new_rgba8(width, height)))
        }

        fn supports_smoothing_quality(&self) -> bool {
            self.smoothing_quality
        }
    }

    #[test]
    fn mock_decodes_configured_dimensions() {
        let backend = MockBackend::with_dimensions(800, 600);
        let surface = backend.decode(&[], "image/png").unwrap();
        assert_eq!(surface.dimensions(), (800, 600));
        assert!(surface.is_bitmap());

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Decode { declared_type } if declared_type == "image/png"));
    }

    #[test]
    fn mock_bitmaps_count_releases() {
        let backend = MockBackend::new();
        let surface = backend.decode(&[], "image/png").unwrap();
        assert_eq!(backend.release_count(), 0);
        drop(surface);
        assert_eq!(backend.release_count(), 1);
    }

    #[test]
    fn mock_fails_at_configured_stage() {
        let backend = MockBackend::new().faulting_at(
            Stage::Encode,
            Fault::Fail(BackendError::Encode("nope".into())),
        );
        let canvas = backend.make_surface(2, 2).unwrap();
        let err = backend
            .encode(&canvas, &OutputFormat::Png, None)
            .unwrap_err();
        assert_eq!(err.to_string(), "nope");
    }

    #[test]
    fn default_backend_has_no_bitmap_resize() {
        struct Minimal;
        impl ImageBackend for Minimal {
            fn decode(&self, _: &[u8], _: &str) -> Result<DecodedSurface, BackendError> {
                unreachable!()
            }
            fn make_surface(&self, w: u32, h: u32) -> Result<Canvas, BackendError> {
                Canvas::allocate(w, h)
            }
            fn draw(&self, _: &mut Canvas, _: &DecodedSurface, _: &DrawRect) -> Result<(), BackendError> {
                Ok(())
            }
            fn encode(&self, _: &Canvas, _: &OutputFormat, _: Option<Quality>) -> Result<Vec<u8>, BackendError> {
                Ok(Vec::new())
            }
            fn supported_formats(&self) -> Vec<OutputFormat> {
                Vec::new()
            }
        }

        let backend = Minimal;
        assert!(!backend.supports_bitmap_resize());
        assert!(!backend.supports_smoothing_quality());
        let bitmap = Bitmap::new(DynamicImage::new_rgb8(1, 1));
        assert!(matches!(
            backend.resize_bitmap(&bitmap, 2, 2, ResampleQuality::High),
            Err(BackendError::Unspecified(_))
        ));
    }

    #[test]
    fn error_display_is_bare_message() {
        assert_eq!(BackendError::Decode("Decode failed".into()).to_string(), "Decode failed");
        assert_eq!(BackendError::Decode("x".into()).kind(), "decode");
    }
}
