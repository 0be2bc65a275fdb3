//! Shared test utilities for the reframe test suite.
//!
//! Provides synthetic encoded images, item builders, and assertions over
//! batches of [`ConversionItem`]s.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let mut items = vec![png_item(1, "a.png", 30, 20), jpeg_item(2, "b.jpg", 16, 8)];
//! run_batch(&RustBackend::new(), &mut items, &options, 2, None).unwrap();
//! assert_statuses(&items, &[ItemStatus::Done, ItemStatus::Done]);
//! ```

use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::convert::{ConversionItem, ItemId, ItemStatus, SourceImage};

// =========================================================================
// Synthetic images
// =========================================================================

/// A small gradient so encoders see real content.
fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, 128])
    })
}

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    gradient(width, height).write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// PNG bytes of a `width` x `height` image.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

/// JPEG bytes of a `width` x `height` image.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

/// Write a synthetic PNG to `dir/name` and return its path.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, png_bytes(width, height)).unwrap();
    path
}

// =========================================================================
// Item builders
// =========================================================================

/// Item whose bytes are never looked at; for use with `MockBackend`.
pub fn mock_item(id: ItemId, name: &str) -> ConversionItem {
    ConversionItem::new(id, SourceImage::new(name, "image/jpeg", vec![0u8; 8]))
}

pub fn png_item(id: ItemId, name: &str, width: u32, height: u32) -> ConversionItem {
    ConversionItem::new(id, SourceImage::new(name, "image/png", png_bytes(width, height)))
        .with_dimensions(Some((width, height)))
}

pub fn jpeg_item(id: ItemId, name: &str, width: u32, height: u32) -> ConversionItem {
    ConversionItem::new(id, SourceImage::new(name, "image/jpeg", jpeg_bytes(width, height)))
        .with_dimensions(Some((width, height)))
}

// =========================================================================
// Assertions
// =========================================================================

/// Assert item statuses in order.
pub fn assert_statuses(items: &[ConversionItem], expected: &[ItemStatus]) {
    let actual: Vec<ItemStatus> = items.iter().map(|i| i.status()).collect();
    assert_eq!(actual, expected, "item statuses mismatch");
}

/// Output dimensions of a done item. Panics if the item has no output.
pub fn output_dimensions(item: &ConversionItem) -> (u32, u32) {
    let output = item.output().unwrap_or_else(|| {
        panic!(
            "item '{}' has no output (status {:?}, error {:?})",
            item.source().name,
            item.status(),
            item.error()
        )
    });
    (output.width, output.height)
}
