//! Turning files on disk into conversion items.
//!
//! Paths given on the command line may be files or directories. Directories
//! are walked recursively and every file whose type can be determined is
//! collected, sorted by path so a batch is reproducible.
//!
//! The declared MIME type comes from the file extension, falling back to
//! sniffing the first bytes. Known dimensions come from a header probe, which
//! reads only as much of the file as the format needs; they are a hint and
//! the decode result stays authoritative.

use crate::convert::{ConversionItem, ItemId, SourceImage};
use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Unknown image type: {}", .0.display())]
    UnknownType(PathBuf),
}

/// Declared MIME type of an image: by extension, else by content sniffing.
pub fn detect_mime(name: &str, bytes: &[u8]) -> Option<&'static str> {
    Path::new(name)
        .extension()
        .and_then(|ext| ImageFormat::from_extension(ext))
        .or_else(|| image::guess_format(bytes).ok())
        .map(|format| format.to_mime_type())
}

/// Pixel size from the image header, if the format is readable.
pub fn probe_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

/// Build an item from in-memory bytes.
pub fn item_from_bytes(
    id: ItemId,
    name: &str,
    bytes: Vec<u8>,
) -> Result<ConversionItem, IngestError> {
    let mime = detect_mime(name, &bytes).ok_or_else(|| IngestError::UnknownType(name.into()))?;
    let dimensions = probe_dimensions(&bytes);
    debug!(id, name, mime, ?dimensions, size = bytes.len(), "ingested");
    Ok(ConversionItem::new(id, SourceImage::new(name, mime, bytes)).with_dimensions(dimensions))
}

/// Build an item from a file. The display name is the file name.
pub fn item_from_path(id: ItemId, path: &Path) -> Result<ConversionItem, IngestError> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    item_from_bytes(id, &name, bytes).map_err(|e| match e {
        IngestError::UnknownType(_) => IngestError::UnknownType(path.to_path_buf()),
        other => other,
    })
}

/// Expand `paths` into image files: files are kept as given, directories
/// are walked recursively and filtered to known image extensions.
///
/// Directory contents are sorted; the order of `paths` is preserved.
pub fn collect_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>, IngestError> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        let mut found = Vec::new();
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && has_image_extension(entry.path()) {
                found.push(entry.into_path());
            }
        }
        debug!(dir = %path.display(), count = found.len(), "walked directory");
        files.extend(found);
    }
    Ok(files)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(ImageFormat::from_extension)
        .is_some()
}
