//! CLI output formatting for batch conversion.
//!
//! # Information-First Display
//!
//! Every item is shown by its positional index and display name; encoding
//! details are secondary context on indented lines. The same index is used
//! in progress lines and in the final listing, so a failure reported while
//! the batch runs can be found again in the results.
//!
//! # Output Format
//!
//! ## Progress
//!
//! ```text
//! Converting 3 images with 2 workers
//! [1/3] 002 beach.png: done
//! [2/3] 001 broken.jpg: error
//!     Error: Decode failed
//! [3/3] 003 dusk.jpg: done
//! Converted 2 of 3 images (1 failed)
//! ```
//!
//! ## Results
//!
//! ```text
//! 001 broken.jpg (error)
//!     Source: image/jpeg, 12 B
//!     Error: Decode failed
//! 002 beach.png → beach.webp
//!     Source: image/png, 1200x800, 1.4 MB
//!     Output: image/webp, 600x400, 88.2 KB
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O and no side effects.

use crate::batch::{BatchEvent, BatchSummary};
use crate::convert::{ConversionItem, ItemId, ItemStatus, OutputArtifact};
use crate::imaging::OutputFormat;
use serde::Serialize;
use std::path::PathBuf;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn status_label(status: ItemStatus) -> &'static str {
    match status {
        ItemStatus::Ready => "ready",
        ItemStatus::Converting => "converting",
        ItemStatus::Done => "done",
        ItemStatus::Error => "error",
    }
}

/// Human-readable byte size with one decimal above 1 KB.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / MB)
    }
}

/// `mime, WxH, size` with the dimensions left out when unknown.
fn details(mime: &str, dimensions: Option<(u32, u32)>, size: u64) -> String {
    match dimensions {
        Some((w, h)) => format!("{}, {}x{}, {}", mime, w, h, format_size(size)),
        None => format!("{}, {}", mime, format_size(size)),
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Format a single batch progress event as display lines.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started { total, workers } => {
            let noun = if *total == 1 { "image" } else { "images" };
            let unit = if *workers == 1 { "worker" } else { "workers" };
            vec![format!("Converting {} {} with {} {}", total, noun, workers, unit)]
        }
        BatchEvent::ItemFinished {
            index,
            name,
            status,
            error,
            completed,
            total,
            ..
        } => {
            let mut lines = vec![format!(
                "[{}/{}] {} {}: {}",
                completed,
                total,
                format_index(index + 1),
                name,
                status_label(*status)
            )];
            if let Some(error) = error {
                lines.push(format!("{}Error: {}", indent(1), error));
            }
            lines
        }
        BatchEvent::Finished(summary) => vec![format_summary(summary)],
    }
}

fn format_summary(summary: &BatchSummary) -> String {
    let noun = if summary.total == 1 { "image" } else { "images" };
    if summary.failed == 0 {
        format!("Converted {} of {} {}", summary.done, summary.total, noun)
    } else {
        format!(
            "Converted {} of {} {} ({} failed)",
            summary.done, summary.total, noun, summary.failed
        )
    }
}

/// Print a batch progress event to stdout.
pub fn print_batch_event(event: &BatchEvent) {
    for line in format_batch_event(event) {
        println!("{}", line);
    }
}

// ============================================================================
// Results
// ============================================================================

/// Format the per-item result listing.
///
/// Done items lead with `source → output`; everything else shows its status
/// in parentheses and, for failures, the error text.
pub fn format_results(items: &[ConversionItem]) -> Vec<String> {
    let mut lines = Vec::new();
    for (pos, item) in items.iter().enumerate() {
        let source = item.source();
        let index = format_index(pos + 1);

        match item.output() {
            Some(output) => {
                lines.push(format!("{} {} \u{2192} {}", index, source.name, output.filename))
            }
            None => lines.push(format!(
                "{} {} ({})",
                index,
                source.name,
                status_label(item.status())
            )),
        }

        lines.push(format!(
            "{}Source: {}",
            indent(1),
            details(&source.mime_type, item.source_dimensions(), source.size)
        ));
        if let Some(output) = item.output() {
            lines.push(format!(
                "{}Output: {}",
                indent(1),
                details(&output.mime_type, Some((output.width, output.height)), output.size)
            ));
        }
        if let Some(error) = item.error() {
            lines.push(format!("{}Error: {}", indent(1), error));
        }
    }
    lines
}

/// Print the result listing to stdout.
pub fn print_results(items: &[ConversionItem]) {
    for line in format_results(items) {
        println!("{}", line);
    }
}

/// Format the list of written artifact paths.
pub fn format_saved(paths: &[PathBuf]) -> Vec<String> {
    if paths.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![format!("Saved {} files", paths.len())];
    lines.extend(
        paths
            .iter()
            .map(|p| format!("{}{}", indent(1), p.display())),
    );
    lines
}

/// Print the written artifact paths to stdout.
pub fn print_saved(paths: &[PathBuf]) {
    for line in format_saved(paths) {
        println!("{}", line);
    }
}

// ============================================================================
// JSON results
// ============================================================================

/// Serializable view of one item for `--json` output.
#[derive(Debug, Serialize)]
pub struct ItemReport<'a> {
    pub id: ItemId,
    pub name: &'a str,
    pub source_type: &'a str,
    pub source_size: u64,
    pub source_dimensions: Option<(u32, u32)>,
    pub status: ItemStatus,
    pub error: Option<&'a str>,
    pub output: Option<&'a OutputArtifact>,
}

impl<'a> From<&'a ConversionItem> for ItemReport<'a> {
    fn from(item: &'a ConversionItem) -> Self {
        let source = item.source();
        Self {
            id: item.id(),
            name: &source.name,
            source_type: &source.mime_type,
            source_size: source.size,
            source_dimensions: item.source_dimensions(),
            status: item.status(),
            error: item.error(),
            output: item.output(),
        }
    }
}

/// Pretty-printed JSON array of [`ItemReport`]s.
pub fn results_json(items: &[ConversionItem]) -> serde_json::Result<String> {
    let reports: Vec<ItemReport<'_>> = items.iter().map(ItemReport::from).collect();
    serde_json::to_string_pretty(&reports)
}

// ============================================================================
// Formats
// ============================================================================

/// Format the encodable output types, one per line.
pub fn format_formats(formats: &[OutputFormat]) -> Vec<String> {
    formats
        .iter()
        .map(|f| format!("{} (.{})", f.mime(), f.extension()))
        .collect()
}

/// Print the encodable output types to stdout.
pub fn print_formats(formats: &[OutputFormat]) {
    for line in format_formats(formats) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
