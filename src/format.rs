//! Output formats and per-format encode options

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Target format of a rasterization.
///
/// `Other` carries any name that is not one of the built-in formats. The
/// general-purpose encoder may still know how to write it; the renderer path
/// rejects it with [`Error::UnsupportedFormat`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EncodingFormat {
    /// Raw RGBA pixels, no container
    Raw,
    Png,
    Jpeg,
    Webp,
    Avif,
    Other(String),
}

impl EncodingFormat {
    /// Canonical lowercase name
    pub fn as_str(&self) -> &str {
        match self {
            EncodingFormat::Raw => "raw",
            EncodingFormat::Png => "png",
            EncodingFormat::Jpeg => "jpeg",
            EncodingFormat::Webp => "webp",
            EncodingFormat::Avif => "avif",
            EncodingFormat::Other(name) => name,
        }
    }

    /// MIME type of buffers produced in this format.
    ///
    /// Raw pixels and unknown names map to `application/octet-stream`.
    pub fn mime_type(&self) -> &'static str {
        match self {
            EncodingFormat::Raw => "application/octet-stream",
            EncodingFormat::Png => "image/png",
            EncodingFormat::Jpeg => "image/jpeg",
            EncodingFormat::Webp => "image/webp",
            EncodingFormat::Avif => "image/avif",
            EncodingFormat::Other(name) => image::ImageFormat::from_extension(name)
                .map(|f| f.to_mime_type())
                .unwrap_or("application/octet-stream"),
        }
    }

    /// Whether this is one of the built-in formats
    pub fn is_builtin(&self) -> bool {
        !matches!(self, EncodingFormat::Other(_))
    }
}

impl fmt::Display for EncodingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for EncodingFormat {
    fn from(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "raw" => EncodingFormat::Raw,
            "png" => EncodingFormat::Png,
            "jpeg" | "jpg" => EncodingFormat::Jpeg,
            "webp" => EncodingFormat::Webp,
            "avif" => EncodingFormat::Avif,
            // Keep the caller's spelling so errors can name it verbatim
            _ => EncodingFormat::Other(name.to_string()),
        }
    }
}

impl From<String> for EncodingFormat {
    fn from(name: String) -> Self {
        EncodingFormat::from(name.as_str())
    }
}

impl FromStr for EncodingFormat {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(EncodingFormat::from(s))
    }
}

/// AVIF encoder configuration. Unset fields use the encoder defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvifConfig {
    /// 0 (worst) to 100 (lossless-ish)
    pub quality: Option<u8>,
    /// 1 (slowest, smallest) to 10 (fastest)
    pub speed: Option<u8>,
    /// Encoder worker threads; defaults to the number of CPUs
    pub threads: Option<usize>,
}

impl AvifConfig {
    pub const DEFAULT_QUALITY: u8 = 80;
    pub const DEFAULT_SPEED: u8 = 4;

    pub fn quality_or_default(&self) -> u8 {
        self.quality.unwrap_or(Self::DEFAULT_QUALITY)
    }

    pub fn speed_or_default(&self) -> u8 {
        self.speed.unwrap_or(Self::DEFAULT_SPEED)
    }

    pub fn threads_or_default(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get).max(1)
    }
}

/// Encode options, keyed by the format they apply to.
///
/// Absent options (`None` at call sites) mean "use the encoder defaults".
///
/// ```
/// use canvasmith::RenderOptions;
///
/// let opts: RenderOptions = serde_json::from_str(r#"{"jpeg":{"quality":80}}"#).unwrap();
/// assert_eq!(opts.quality(), Some(80));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderOptions {
    Jpeg { quality: u8 },
    Webp { quality: u8 },
    Avif(AvifConfig),
}

impl RenderOptions {
    /// Format these options were built for
    pub fn format(&self) -> EncodingFormat {
        match self {
            RenderOptions::Jpeg { .. } => EncodingFormat::Jpeg,
            RenderOptions::Webp { .. } => EncodingFormat::Webp,
            RenderOptions::Avif(_) => EncodingFormat::Avif,
        }
    }

    /// Bare quality level for the jpeg and webp variants
    pub fn quality(&self) -> Option<u8> {
        match self {
            RenderOptions::Jpeg { quality } | RenderOptions::Webp { quality } => Some(*quality),
            RenderOptions::Avif(_) => None,
        }
    }

    pub fn avif(&self) -> Option<&AvifConfig> {
        match self {
            RenderOptions::Avif(config) => Some(config),
            _ => None,
        }
    }

    /// Reject options that do not belong to `format` or carry out-of-range values.
    pub fn validate_for(&self, format: &EncodingFormat) -> Result<()> {
        let own = self.format();
        if &own != format {
            return Err(Error::OptionsMismatch {
                format: format.to_string(),
                options: match own {
                    EncodingFormat::Jpeg => "jpeg",
                    EncodingFormat::Webp => "webp",
                    _ => "avif",
                },
            });
        }

        match self {
            RenderOptions::Jpeg { quality } | RenderOptions::Webp { quality } => {
                if !(1..=100).contains(quality) {
                    return Err(Error::InvalidOptions(format!(
                        "{} quality must be within 1..=100, got {}",
                        own, quality
                    )));
                }
            }
            RenderOptions::Avif(config) => {
                if let Some(q) = config.quality {
                    if q > 100 {
                        return Err(Error::InvalidOptions(format!(
                            "avif quality must be within 0..=100, got {}",
                            q
                        )));
                    }
                }
                if let Some(s) = config.speed {
                    if !(1..=10).contains(&s) {
                        return Err(Error::InvalidOptions(format!(
                            "avif speed must be within 1..=10, got {}",
                            s
                        )));
                    }
                }
                if config.threads == Some(0) {
                    return Err(Error::InvalidOptions("avif threads must be at least 1".into()));
                }
            }
        }
        Ok(())
    }
}
