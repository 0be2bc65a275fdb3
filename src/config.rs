//! Conversion configuration.
//!
//! Handles loading, validating, and merging `reframe.toml`. Configuration is
//! layered: stock defaults are overridden by the config file, and the config
//! file is overridden by command-line flags.
//!
//! ## Config File Location
//!
//! `reframe.toml` in the working directory is picked up automatically; any
//! other file can be given with `--config <PATH>`.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! format = "image/webp"     # MIME type or extension (png, jpg, webp, avif)
//! quality = 0.9             # Lossy quality, 0.0 - 1.0
//!
//! [resize]
//! mode = "none"             # "none", "pixels", or "scale"
//! # width = 1200            # pixels mode; omit one side to keep aspect ratio
//! # height = 800
//! percent = 100.0           # scale mode, clamped to 1 - 1000
//!
//! [draw]
//! fit = "contain"           # "keep", "contain", "cover", or "stretch"
//! background = "#ffffff"    # Fill for formats without alpha (JPEG)
//! smoothing = true
//! smoothing_quality = "high"
//! resample_quality = "high" # "off", "pixelated", "low", "medium", "high"
//!
//! [processing]
//! # max_workers = 4         # Cap on parallel conversions (omit for auto)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [output]
//! format = "jpg"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::batch::concurrency_for;
use crate::imaging::{
    Background, ConversionOptions, Fit, OutputFormat, Quality, ResampleQuality, Resize,
    SmoothingQuality,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "reframe.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Conversion configuration loaded from `reframe.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReframeConfig {
    /// Target encoding.
    pub output: OutputConfig,
    /// Target size.
    pub resize: ResizeConfig,
    /// Compositing settings.
    pub draw: DrawConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl ReframeConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be between 0.0 and 1.0".into(),
            ));
        }
        if self.output.format.mime().is_empty() {
            return Err(ConfigError::Validation(
                "output.format must not be empty".into(),
            ));
        }
        if self.resize.percent.is_nan() || self.resize.percent <= 0.0 {
            return Err(ConfigError::Validation(
                "resize.percent must be positive".into(),
            ));
        }
        if self.resize.width == Some(0) || self.resize.height == Some(0) {
            return Err(ConfigError::Validation(
                "resize.width and resize.height must be non-zero".into(),
            ));
        }
        if self.processing.max_workers == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_workers must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Conversion options for one batch.
    pub fn to_options(&self) -> ConversionOptions {
        ConversionOptions {
            format: self.output.format.clone(),
            quality: Quality::new(self.output.quality as f32),
            resize: self.resize.to_resize(),
            fit: self.draw.fit,
            background: self.draw.background,
            smoothing: self.draw.smoothing,
            smoothing_quality: self.draw.smoothing_quality,
            resample_quality: self.draw.resample_quality,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// MIME type or extension.
    pub format: OutputFormat,
    /// Lossy quality, 0.0 - 1.0. Ignored by lossless encodings.
    pub quality: f64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            quality: 0.9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeMode {
    #[default]
    None,
    Pixels,
    Scale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub mode: SizeMode,
    /// Pixels mode only.
    pub width: Option<u32>,
    /// Pixels mode only.
    pub height: Option<u32>,
    /// Scale mode only.
    pub percent: f64,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            mode: SizeMode::None,
            width: None,
            height: None,
            percent: 100.0,
        }
    }
}

impl ResizeConfig {
    pub fn to_resize(&self) -> Resize {
        match self.mode {
            SizeMode::None => Resize::None,
            SizeMode::Pixels => Resize::Pixels {
                width: self.width,
                height: self.height,
            },
            SizeMode::Scale => Resize::Scale {
                percent: self.percent,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DrawConfig {
    pub fit: Fit,
    /// Fill for encodings without alpha.
    pub background: Background,
    pub smoothing: bool,
    pub smoothing_quality: SmoothingQuality,
    pub resample_quality: ResampleQuality,
}

impl Default for DrawConfig {
    fn default() -> Self {
        let options = ConversionOptions::default();
        Self {
            fit: options.fit,
            background: options.background,
            smoothing: options.smoothing,
            smoothing_quality: options.smoothing_quality,
            resample_quality: options.resample_quality,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel conversions. When absent, derived from the
    /// available parallelism.
    pub max_workers: Option<usize>,
}

/// Resolve the effective worker count for a parallelism `hint`.
///
/// `max_workers` can only lower the derived concurrency, never raise it.
pub fn effective_workers(config: &ProcessingConfig, hint: usize) -> usize {
    let derived = concurrency_for(hint);
    config
        .max_workers
        .map(|n| n.clamp(1, derived))
        .unwrap_or(derived)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Serialize the stock defaults to a TOML value for merging.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ReframeConfig::default()).expect("default config must serialize")
}

/// Deep-merge `overlay` into `base`. Tables merge key by key; any other
/// overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value. A missing file is `None`.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay over `base`, deserialize, and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ReframeConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ReframeConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from `path`, or from [`DEFAULT_CONFIG_FILE`] in the
/// working directory when `path` is `None`.
///
/// An explicitly given file must exist; the implicit one is optional.
pub fn load_config(path: Option<&Path>) -> Result<ReframeConfig, ConfigError> {
    let overlay = match path {
        Some(explicit) => {
            let content = fs::read_to_string(explicit)?;
            Some(toml::from_str(&content)?)
        }
        None => load_raw_config(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Fully commented stock `reframe.toml`.
pub fn stock_config_toml() -> &'static str {
    r##"# Reframe Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# reframe reads ./reframe.toml, or the file given with --config.
# Command-line flags override anything set here.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output encoding
# ---------------------------------------------------------------------------
[output]
# MIME type or extension: png, jpg, webp, avif.
format = "image/webp"

# Lossy quality (0.0 = worst, 1.0 = best). PNG ignores it.
quality = 0.9

# ---------------------------------------------------------------------------
# Target size
# ---------------------------------------------------------------------------
[resize]
# "none" keeps the source size, "pixels" uses width/height,
# "scale" uses percent.
mode = "none"

# Pixels mode. Give one side to keep the source aspect ratio.
# width = 1200
# height = 800

# Scale mode, clamped to 1 - 1000.
percent = 100.0

# ---------------------------------------------------------------------------
# Compositing
# ---------------------------------------------------------------------------
[draw]
# keep:    draw at source size (only when the size is unchanged)
# contain: letterbox, never crops
# cover:   center-crop to fill, never letterboxes
# stretch: fill the target, ignoring aspect ratio
fit = "contain"

# Fill color for formats without alpha (JPEG): #rgb, #rrggbb or #rrggbbaa.
background = "#ffffff"

# Interpolate when scaling. Off gives hard pixel edges.
smoothing = true

# Interpolation filter: low, medium, high.
smoothing_quality = "high"

# Pre-resize before drawing (keep/stretch only): off, pixelated, low, medium, high.
resample_quality = "high"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel conversions. Can only lower the automatic value
# (available cores - 1, at most 6).
# max_workers = 4
"##
}
