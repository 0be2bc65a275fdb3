//! # Reframe
//!
//! Batch raster image conversion: re-encode a set of images to one target
//! format, optionally resizing them with a chosen fit mode, in parallel.
//!
//! # Architecture: One Pipeline, Many Items
//!
//! Every source image becomes a [`ConversionItem`](convert::ConversionItem)
//! that is converted independently. A batch runs the same pipeline over all
//! items on a bounded pool of workers:
//!
//! ```text
//! ingest      files     →  ConversionItem (ready)
//! batch       items     →  N workers pulling from a shared cursor
//! convert     item      →  decode → size → canvas → draw → encode
//!                          ConversionItem (done | error)
//! ```
//!
//! Geometry is pure and lives apart from pixel work:
//!
//! - **Target size** from source size and resize mode:
//!   [`resolve_dimensions`](imaging::resolve_dimensions).
//! - **Draw rectangle** from source size, target size and fit mode:
//!   [`calculate_draw_rect`](imaging::calculate_draw_rect).
//! - **Pixels** behind the [`ImageBackend`](imaging::ImageBackend) trait, so
//!   pipeline and scheduler tests run against a recording mock.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Geometry, conversion parameters, surfaces, backend trait, `image`-crate backend, pre-draw resample |
//! | [`convert`] | Conversion items, the per-item pipeline, output filename derivation |
//! | [`batch`] | Bounded-concurrency scheduler with progress events |
//! | [`ingest`] | Files and bytes to conversion items; directory expansion |
//! | [`config`] | Layered `reframe.toml` loading, validation, and defaults |
//! | [`output`] | CLI output formatting for progress, results, and formats |
//!
//! # Design Decisions
//!
//! ## Failures Stay With Their Item
//!
//! A corrupt file in a batch of hundreds is the common case, not an
//! exceptional one. Every failure inside the pipeline, including a panic in
//! a decoder, is caught and recorded as the item's error text. The batch
//! always runs to the end and reports how many items failed.
//!
//! ## Scoped Bitmap Release
//!
//! Fast-path bitmaps carry a release hook that runs when the
//! [`Bitmap`](imaging::Bitmap) is dropped. Success, failure, panic, and
//! resample replacement all release each bitmap exactly once without any
//! explicit cleanup in the pipeline.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging::RustBackend`] uses the `image` crate for every codec, so
//! the binary has no system dependencies.

pub mod batch;
pub mod config;
pub mod convert;
pub mod imaging;
pub mod ingest;
pub mod output;

#[cfg(test)]
pub(crate) mod test_helpers;
