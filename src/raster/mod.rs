//! SVG rasterization with backend selection.
//!
//! Backends are kept in priority order. The general-purpose encoder comes
//! first when it is installed, the raw-pixel renderer second. A render goes
//! to the first backend that supports the requested format; its result or
//! error is returned as-is, with no retry on another backend.

pub mod backend;
pub mod transformer;

use std::fmt;
use std::sync::Arc;

use log::debug;
use tokio_util::sync::CancellationToken;

use crate::capability::{Capabilities, CapabilityKind, CapabilityLoader};
use crate::encoded::ImageResult;
use crate::error::{Error, Result};
use crate::format::{EncodingFormat, RenderOptions};
use crate::RasterConfig;

pub use backend::{EncoderBackend, RasterBackend, RenderJob, RendererBackend};
pub use transformer::Transformer;

/// Turns SVG markup into encoded image buffers
pub struct SvgRasterizer {
    backends: Vec<Box<dyn RasterBackend>>,
}

impl SvgRasterizer {
    /// Build the backend chain from resolved capabilities
    pub fn new(capabilities: &Capabilities, config: &RasterConfig) -> Self {
        let mut backends: Vec<Box<dyn RasterBackend>> = Vec::new();
        if let Some(encoder) = capabilities.raster_encoder() {
            backends.push(Box::new(EncoderBackend::new(encoder.clone())));
        }
        if let Some(renderer) = capabilities.svg_renderer() {
            backends.push(Box::new(RendererBackend::new(
                renderer.clone(),
                config.renderer.clone(),
            )));
        }
        Self { backends }
    }

    /// Use the process-wide capability loader
    pub fn detect() -> Self {
        Self::new(
            &CapabilityLoader::global().capabilities(),
            &RasterConfig::from_env(),
        )
    }

    /// Use an explicit backend chain, tried in order
    pub fn with_backends(backends: Vec<Box<dyn RasterBackend>>) -> Self {
        Self { backends }
    }

    /// Names of the configured backends, in priority order
    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Render `svg` to `format`.
    ///
    /// `options` must belong to `format` when given. `signal` only reaches
    /// the pixel transform of the renderer path (jpeg, webp, avif).
    ///
    /// # Errors
    ///
    /// - [`Error::MissingCapability`] when no backend is installed
    /// - [`Error::OptionsMismatch`] / [`Error::InvalidOptions`] for bad options
    /// - [`Error::UnsupportedFormat`] when no installed backend can produce `format`
    /// - any backend error, unchanged
    pub async fn render(
        &self,
        svg: impl AsRef<[u8]>,
        format: EncodingFormat,
        options: Option<RenderOptions>,
        signal: Option<CancellationToken>,
    ) -> Result<Vec<u8>> {
        if self.backends.is_empty() {
            return Err(Error::MissingCapability(CapabilityKind::Renderer.name()));
        }

        if let Some(opts) = &options {
            opts.validate_for(&format)?;
        }

        let backend = self
            .backends
            .iter()
            .find(|b| b.supports(&format))
            .ok_or_else(|| Error::UnsupportedFormat(format.to_string()))?;

        debug!("rendering svg as {} via {} backend", format, backend.name());

        backend
            .render(RenderJob {
                svg: Arc::from(svg.as_ref()),
                format,
                options,
                signal,
            })
            .await
    }

    /// Like [`render`](Self::render), wrapping the output with its MIME type
    pub async fn render_image(
        &self,
        svg: impl AsRef<[u8]>,
        format: EncodingFormat,
        options: Option<RenderOptions>,
        signal: Option<CancellationToken>,
    ) -> Result<ImageResult> {
        let mime = format.mime_type();
        let data = self.render(svg, format, options, signal).await?;
        Ok(ImageResult::new(data, mime))
    }
}

impl Default for SvgRasterizer {
    fn default() -> Self {
        Self::detect()
    }
}

impl fmt::Debug for SvgRasterizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SvgRasterizer")
            .field("backends", &self.backend_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_capabilities_means_missing_dependency() {
        let r = SvgRasterizer::new(&Capabilities::none(), &RasterConfig::default());
        assert!(r.backend_names().is_empty());

        for format in ["png", "raw", "avif", "bogus"] {
            let err = r
                .render("<svg/>", EncodingFormat::from(format), None, None)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::MissingCapability("resvg")));
        }
    }

    #[cfg(feature = "renderer")]
    #[tokio::test]
    async fn renderer_only_chain() {
        use crate::capability::native::ResvgRenderer;

        let caps = Capabilities::none().with_svg_renderer(Arc::new(ResvgRenderer::new()));
        let r = SvgRasterizer::new(&caps, &RasterConfig::default());
        assert_eq!(r.backend_names(), vec!["renderer"]);

        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="2" height="2"/>"#;
        let png = r.render(svg, EncodingFormat::Png, None, None).await.unwrap();
        assert_eq!(&png[0..4], &[0x89, 0x50, 0x4E, 0x47]);
    }
}
