//! Optional rendering capabilities and the loader that probes for them.
//!
//! Two capabilities are tracked independently:
//!
//! - a [`RasterEncoder`]: a general-purpose image toolkit that turns SVG bytes
//!   straight into an encoded image,
//! - an [`SvgRenderer`]: a lower-level rasterizer producing raw pixels.
//!
//! Availability is decided by a [`CapabilityProvider`]. The
//! [`CapabilityLoader`] asks its provider at most once per capability and
//! caches the outcome, including "unavailable".

use std::fmt;
use std::sync::{Arc, OnceLock};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tiny_skia::Pixmap;

use crate::error::Result;
use crate::format::EncodingFormat;
use crate::RasterConfig;

#[cfg(feature = "resvg")]
pub mod native;
#[cfg(feature = "encoder")]
pub mod toolkit;

/// Names a capability for probing and configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityKind {
    /// General-purpose image toolkit
    Encoder,
    /// Raw-pixel SVG renderer
    Renderer,
}

impl CapabilityKind {
    /// Human-readable name used in errors and logs
    pub fn name(self) -> &'static str {
        match self {
            CapabilityKind::Encoder => "image-toolkit",
            CapabilityKind::Renderer => "resvg",
        }
    }

    /// Parse the identifiers accepted by `CANVASMITH_DISABLE`
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "encoder" => Some(CapabilityKind::Encoder),
            "renderer" => Some(CapabilityKind::Renderer),
            _ => None,
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed configuration handed to an [`SvgRenderer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererOptions {
    /// Whether the renderer may load fonts installed on the system
    pub load_system_fonts: bool,
    /// Verbosity of the renderer's own diagnostics
    #[serde(with = "level_filter")]
    pub log_level: log::LevelFilter,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            load_system_fonts: false,
            log_level: log::LevelFilter::Off,
        }
    }
}

mod level_filter {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(level: &log::LevelFilter, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(level.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<log::LevelFilter, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Pixels produced by an [`SvgRenderer`].
///
/// The buffer is premultiplied RGBA in row-major order, exactly as the
/// renderer produced it.
#[derive(Debug, Clone)]
pub struct RenderedSvg {
    pixmap: Pixmap,
}

impl RenderedSvg {
    pub fn new(pixmap: Pixmap) -> Self {
        Self { pixmap }
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Raw premultiplied pixels
    pub fn pixels(&self) -> &[u8] {
        self.pixmap.data()
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixmap.take()
    }

    /// Encode with the renderer's own PNG encoder
    pub fn as_png(&self) -> Result<Vec<u8>> {
        Ok(self.pixmap.encode_png()?)
    }

    /// Straight (non-premultiplied) RGBA copy of the pixels, as image encoders expect
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixmap.data().len());
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        out
    }
}

/// General-purpose encoder: SVG bytes in, encoded image out.
///
/// Per-call quality beyond the fixed level and cancellation are not part of
/// this contract.
pub trait RasterEncoder: Send + Sync {
    /// Whether `format` can be produced
    fn supports(&self, format: &EncodingFormat) -> bool;

    /// Rasterize `svg` and encode it as `format` at `quality` (0..=100)
    fn encode(&self, svg: &[u8], format: &EncodingFormat, quality: u8) -> Result<Vec<u8>>;
}

/// Low-level SVG rasterizer producing raw pixels
pub trait SvgRenderer: Send + Sync {
    fn render(&self, svg: &[u8], options: &RendererOptions) -> Result<RenderedSvg>;
}

/// Decides which capabilities exist. Consulted once per capability by a
/// [`CapabilityLoader`].
pub trait CapabilityProvider: Send + Sync {
    fn raster_encoder(&self) -> Option<Arc<dyn RasterEncoder>>;
    fn svg_renderer(&self) -> Option<Arc<dyn SvgRenderer>>;
}

/// Provider backed by the capabilities compiled into this build.
///
/// A capability is available when its cargo feature is enabled and it is
/// not listed in `disabled`.
#[derive(Debug, Clone, Default)]
pub struct NativeProvider {
    disabled: Vec<CapabilityKind>,
}

impl NativeProvider {
    pub fn new(disabled: Vec<CapabilityKind>) -> Self {
        Self { disabled }
    }

    fn is_disabled(&self, kind: CapabilityKind) -> bool {
        let disabled = self.disabled.contains(&kind);
        if disabled {
            warn!("{} capability disabled by configuration", kind);
        }
        disabled
    }
}

impl CapabilityProvider for NativeProvider {
    fn raster_encoder(&self) -> Option<Arc<dyn RasterEncoder>> {
        if self.is_disabled(CapabilityKind::Encoder) {
            return None;
        }
        #[cfg(feature = "encoder")]
        {
            Some(Arc::new(toolkit::ImageToolkit::new()))
        }
        #[cfg(not(feature = "encoder"))]
        {
            None
        }
    }

    fn svg_renderer(&self) -> Option<Arc<dyn SvgRenderer>> {
        if self.is_disabled(CapabilityKind::Renderer) {
            return None;
        }
        #[cfg(feature = "renderer")]
        {
            Some(Arc::new(native::ResvgRenderer::new()))
        }
        #[cfg(not(feature = "renderer"))]
        {
            None
        }
    }
}

/// Provider that reports nothing installed
#[derive(Debug, Clone, Copy, Default)]
pub struct AbsentProvider;

impl CapabilityProvider for AbsentProvider {
    fn raster_encoder(&self) -> Option<Arc<dyn RasterEncoder>> {
        None
    }

    fn svg_renderer(&self) -> Option<Arc<dyn SvgRenderer>> {
        None
    }
}

/// A resolved set of capabilities.
///
/// Also serves as an explicit provider, which is how callers inject their own
/// implementations.
#[derive(Clone, Default)]
pub struct Capabilities {
    raster_encoder: Option<Arc<dyn RasterEncoder>>,
    svg_renderer: Option<Arc<dyn SvgRenderer>>,
}

impl Capabilities {
    /// No capabilities
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_raster_encoder(mut self, encoder: Arc<dyn RasterEncoder>) -> Self {
        self.raster_encoder = Some(encoder);
        self
    }

    pub fn with_svg_renderer(mut self, renderer: Arc<dyn SvgRenderer>) -> Self {
        self.svg_renderer = Some(renderer);
        self
    }

    pub fn raster_encoder(&self) -> Option<&Arc<dyn RasterEncoder>> {
        self.raster_encoder.as_ref()
    }

    pub fn svg_renderer(&self) -> Option<&Arc<dyn SvgRenderer>> {
        self.svg_renderer.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.raster_encoder.is_none() && self.svg_renderer.is_none()
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("raster_encoder", &self.raster_encoder.is_some())
            .field("svg_renderer", &self.svg_renderer.is_some())
            .finish()
    }
}

impl CapabilityProvider for Capabilities {
    fn raster_encoder(&self) -> Option<Arc<dyn RasterEncoder>> {
        self.raster_encoder.clone()
    }

    fn svg_renderer(&self) -> Option<Arc<dyn SvgRenderer>> {
        self.svg_renderer.clone()
    }
}

/// Probes capabilities lazily and caches each outcome for the loader's lifetime
pub struct CapabilityLoader {
    provider: Box<dyn CapabilityProvider>,
    raster_encoder: OnceLock<Option<Arc<dyn RasterEncoder>>>,
    svg_renderer: OnceLock<Option<Arc<dyn SvgRenderer>>>,
}

static GLOBAL_LOADER: OnceLock<CapabilityLoader> = OnceLock::new();

impl CapabilityLoader {
    pub fn new(provider: impl CapabilityProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
            raster_encoder: OnceLock::new(),
            svg_renderer: OnceLock::new(),
        }
    }

    /// Process-wide loader using the native provider, configured from the
    /// environment on first use.
    pub fn global() -> &'static CapabilityLoader {
        GLOBAL_LOADER.get_or_init(|| {
            let config = RasterConfig::from_env();
            CapabilityLoader::new(NativeProvider::new(config.disabled))
        })
    }

    pub fn raster_encoder(&self) -> Option<Arc<dyn RasterEncoder>> {
        self.raster_encoder
            .get_or_init(|| {
                let found = self.provider.raster_encoder();
                debug!(
                    "probed {} capability: {}",
                    CapabilityKind::Encoder,
                    if found.is_some() { "available" } else { "absent" }
                );
                found
            })
            .clone()
    }

    pub fn svg_renderer(&self) -> Option<Arc<dyn SvgRenderer>> {
        self.svg_renderer
            .get_or_init(|| {
                let found = self.provider.svg_renderer();
                debug!(
                    "probed {} capability: {}",
                    CapabilityKind::Renderer,
                    if found.is_some() { "available" } else { "absent" }
                );
                found
            })
            .clone()
    }

    /// Whether `kind` is available
    pub fn probe(&self, kind: CapabilityKind) -> bool {
        match kind {
            CapabilityKind::Encoder => self.raster_encoder().is_some(),
            CapabilityKind::Renderer => self.svg_renderer().is_some(),
        }
    }

    /// Snapshot of both capabilities, probing any that have not been resolved
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            raster_encoder: self.raster_encoder(),
            svg_renderer: self.svg_renderer(),
        }
    }
}

impl fmt::Debug for CapabilityLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityLoader")
            .field("raster_encoder", &self.raster_encoder.get().map(|c| c.is_some()))
            .field("svg_renderer", &self.svg_renderer.get().map(|c| c.is_some()))
            .finish()
    }
}
