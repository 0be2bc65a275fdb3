//! Parameter types for a conversion.
//!
//! These types describe *what* a conversion should produce, not *how*. They
//! are the interface between the pipeline (which decides geometry and draw
//! order) and the [`backend`](super::backend) (which does the pixel work).
//!
//! ## Types
//!
//! - [`OutputFormat`]: target encoding, addressed by MIME type. Knows its file
//!   extension, whether it can carry alpha, and whether it takes a quality.
//! - [`Quality`]: lossy encoding quality in `[0, 1]`. Clamped on construction.
//! - [`Resize`]: how target dimensions are derived from the source.
//! - [`Fit`]: how source and target aspect ratios are reconciled when drawing.
//! - [`Background`]: RGBA fill for encodings without an alpha channel.
//! - [`SmoothingQuality`], [`ResampleQuality`]: draw-time and pre-draw filter hints.
//! - [`ConversionOptions`]: everything above, fixed for one conversion call.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target encoding, addressed by MIME type.
///
/// Unknown MIME types are preserved in [`OutputFormat::Other`] so they can
/// round-trip through configuration; encoding them fails at the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OutputFormat {
    Png,
    Jpeg,
    #[default]
    WebP,
    Avif,
    Other(String),
}

impl OutputFormat {
    /// Map a MIME type to a format. Matching is case-insensitive.
    pub fn from_mime(mime: &str) -> Self {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Self::Png,
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            "image/webp" => Self::WebP,
            "image/avif" => Self::Avif,
            other => Self::Other(other.to_string()),
        }
    }

    /// Parse either a MIME type (`image/webp`) or a bare extension (`webp`, `jpg`).
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.contains('/') {
            return Self::from_mime(value);
        }
        match value.to_ascii_lowercase().as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "webp" => Self::WebP,
            "avif" => Self::Avif,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn mime(&self) -> &str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Avif => "image/avif",
            Self::Other(mime) => mime,
        }
    }

    /// Canonical file extension. Unknown types get the generic `img`.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Avif => "avif",
            Self::Other(_) => "img",
        }
    }

    /// Whether the encoding can represent transparency.
    pub fn supports_alpha(&self) -> bool {
        !matches!(self, Self::Jpeg)
    }

    /// Whether the encoder takes a quality setting.
    pub fn accepts_quality(&self) -> bool {
        matches!(self, Self::Jpeg | Self::WebP | Self::Avif)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

impl From<String> for OutputFormat {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<OutputFormat> for String {
    fn from(value: OutputFormat) -> Self {
        value.mime().to_string()
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().is_empty() {
            return Err("output format must not be empty".to_string());
        }
        Ok(Self::parse(value))
    }
}

/// Quality setting for lossy encoding, `0.0` (worst) to `1.0` (best).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quality(f32);

impl Quality {
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Quality as an encoder percentage (1–100).
    pub fn percent(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(0.9)
    }
}

/// How the target size is derived from the source size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Resize {
    /// Keep the source size.
    #[default]
    None,
    /// Explicit pixel size. A missing (or zero) side is derived from the
    /// source aspect ratio; with both sides missing the source size is kept.
    Pixels {
        width: Option<u32>,
        height: Option<u32>,
    },
    /// Uniform scale in percent, clamped to `[1, 1000]`.
    Scale { percent: f64 },
}

/// Policy for reconciling source and target aspect ratios in one draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fit {
    /// Draw at source size. Only meaningful when no resize happens; otherwise
    /// behaves like [`Fit::Stretch`].
    Keep,
    /// Letterbox: scale uniformly to fit inside the target, centered.
    #[default]
    Contain,
    /// Crop-to-fill: scale uniformly to cover the target, center-cropped.
    Cover,
    /// Scale each axis independently to the target size.
    Stretch,
}

impl FromStr for Fit {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(Self::Keep),
            "contain" => Ok(Self::Contain),
            "cover" => Ok(Self::Cover),
            "stretch" => Ok(Self::Stretch),
            other => Err(format!(
                "unknown fit '{other}'. Expected keep, contain, cover, or stretch"
            )),
        }
    }
}

/// Draw-time smoothing filter hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmoothingQuality {
    Low,
    Medium,
    #[default]
    High,
}

impl FromStr for SmoothingQuality {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!(
                "unknown smoothing quality '{other}'. Expected low, medium, or high"
            )),
        }
    }
}

/// Filter hint for the pre-draw bitmap resize. `Off` disables the resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleQuality {
    Off,
    Pixelated,
    Low,
    Medium,
    #[default]
    High,
}

impl FromStr for ResampleQuality {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "pixelated" => Ok(Self::Pixelated),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!(
                "unknown resample quality '{other}'. Expected off, pixelated, low, medium, or high"
            )),
        }
    }
}

/// Background fill as straight (non-premultiplied) RGBA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Background(pub [u8; 4]);

impl Background {
    pub const WHITE: Self = Self([255, 255, 255, 255]);

    pub fn rgba(self) -> [u8; 4] {
        self.0
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::WHITE
    }
}

impl FromStr for Background {
    type Err = String;

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let hex = value.trim().trim_start_matches('#');
        let invalid = || format!("invalid color '{value}'. Expected #rgb, #rrggbb, or #rrggbbaa");
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
        match hex.len() {
            3 => {
                let mut rgba = [255u8; 4];
                for (i, c) in hex.chars().enumerate() {
                    rgba[i] = channel(&c.to_string().repeat(2))?;
                }
                Ok(Self(rgba))
            }
            6 | 8 => {
                let mut rgba = [255u8; 4];
                for i in 0..hex.len() / 2 {
                    rgba[i] = channel(&hex[i * 2..i * 2 + 2])?;
                }
                Ok(Self(rgba))
            }
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Background {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Background> for String {
    fn from(value: Background) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0;
        if a == 255 {
            write!(f, "#{r:02x}{g:02x}{b:02x}")
        } else {
            write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}

/// Full specification of one conversion. Immutable for the duration of a call.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOptions {
    pub format: OutputFormat,
    pub quality: Quality,
    pub resize: Resize,
    pub fit: Fit,
    /// Used only when `format` has no alpha channel.
    pub background: Background,
    pub smoothing: bool,
    pub smoothing_quality: SmoothingQuality,
    pub resample_quality: ResampleQuality,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            quality: Quality::default(),
            resize: Resize::None,
            fit: Fit::default(),
            background: Background::default(),
            smoothing: true,
            smoothing_quality: SmoothingQuality::default(),
            resample_quality: ResampleQuality::default(),
        }
    }
}
