//! Image processing in pure Rust, with no system libraries.
//!
//! | Step | Where |
//! |---|---|
//! | **Target size** | [`resolve_dimensions`] |
//! | **Fit geometry** | [`calculate_draw_rect`] → [`DrawRect`] |
//! | **Pre-draw resize** | [`resample`](resample::resample) (fast-path bitmaps only) |
//! | **Decode / draw / encode** | [`ImageBackend`], implemented by [`RustBackend`] |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and rectangle math (unit testable)
//! - **Parameters**: Data structures describing a conversion
//! - **Surface**: Decoded sources, scoped bitmap release, and the draw canvas
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Resample**: Conditional bitmap resize before compositing

pub mod backend;
mod calculations;
mod params;
pub mod resample;
pub mod rust_backend;
pub mod surface;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{DrawRect, calculate_draw_rect, resolve_dimensions};
pub use params::{
    Background, ConversionOptions, Fit, OutputFormat, Quality, ResampleQuality, Resize,
    SmoothingQuality,
};
pub use rust_backend::RustBackend;
pub use surface::{Bitmap, Canvas, DecodedSurface};
