//! Canvasmith
//!
//! Rasterize SVG into encoded image buffers through whichever native backend
//! is available, and compose images on a plugin-extensible drawing surface.
//!
//! # Features
//!
//! - **encoder** (default): general-purpose image toolkit capability. Tried
//!   first; always encodes at full quality.
//! - **renderer** (default): raw-pixel SVG renderer plus per-format
//!   transformer honouring encode options and cancellation.
//! - **remote**: fetch `http(s)` image sources in
//!   [`DrawingSurface::load_image`].
//!
//! # Example
//!
//! ```no_run
//! use canvasmith::{EncodingFormat, RenderOptions, SvgRasterizer};
//!
//! # async fn run() -> canvasmith::Result<()> {
//! let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="64" height="64">
//!     <circle cx="32" cy="32" r="30" fill="teal"/>
//! </svg>"#;
//!
//! let rasterizer = SvgRasterizer::detect();
//! let image = rasterizer
//!     .render_image(svg, EncodingFormat::Jpeg, Some(RenderOptions::Jpeg { quality: 85 }), None)
//!     .await?;
//! println!("{}", image.to_data_url());
//! # Ok(())
//! # }
//! ```

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod capability;
pub mod encoded;
pub mod format;
pub mod raster;
pub mod surface;

pub use capability::{
    Capabilities, CapabilityKind, CapabilityLoader, CapabilityProvider, RasterEncoder,
    RenderedSvg, RendererOptions, SvgRenderer,
};
pub use encoded::{svg_data_url, ImageResult};
pub use format::{AvifConfig, EncodingFormat, RenderOptions};
pub use raster::{SvgRasterizer, Transformer};
pub use surface::{
    DecodedImage, DrawingSurface, ImageSource, Plugin, PluginContext, PluginManager,
    SurfaceConfig, SurfaceInfo,
};

/// Re-exported so callers can draw on [`DrawingSurface::context`] and build
/// [`RenderedSvg`] values without a separate dependency.
pub use tiny_skia;
pub use tokio_util::sync::CancellationToken;

/// Environment variable listing capabilities to treat as absent
pub const DISABLE_ENV: &str = "CANVASMITH_DISABLE";

/// Rasterization configuration
///
/// # Examples
///
/// ```
/// let cfg = canvasmith::RasterConfig::default();
/// assert!(!cfg.renderer.load_system_fonts);
/// assert!(cfg.disabled.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// Options handed to the SVG renderer on every call
    pub renderer: RendererOptions,
    /// Capabilities to treat as absent even when compiled in
    pub disabled: Vec<CapabilityKind>,
}

impl RasterConfig {
    /// Defaults, with `disabled` read from `CANVASMITH_DISABLE`
    /// (comma-separated `encoder`, `renderer`). Unknown names are ignored.
    pub fn from_env() -> Self {
        let disabled = std::env::var(DISABLE_ENV)
            .map(|v| Self::parse_disabled(&v))
            .unwrap_or_default();
        Self {
            disabled,
            ..Default::default()
        }
    }

    fn parse_disabled(value: &str) -> Vec<CapabilityKind> {
        let mut kinds = Vec::new();
        for kind in value.split(',').filter_map(CapabilityKind::parse) {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        kinds
    }
}

static DEFAULT_RASTERIZER: OnceLock<SvgRasterizer> = OnceLock::new();

/// Render with a process-wide rasterizer built from the detected capabilities.
///
/// See [`SvgRasterizer::render`].
pub async fn render_svg(
    svg: impl AsRef<[u8]>,
    format: EncodingFormat,
    options: Option<RenderOptions>,
    signal: Option<CancellationToken>,
) -> Result<Vec<u8>> {
    DEFAULT_RASTERIZER
        .get_or_init(SvgRasterizer::detect)
        .render(svg, format, options, signal)
        .await
}
