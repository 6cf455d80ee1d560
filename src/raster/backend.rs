//! Backend strategies tried in order by [`SvgRasterizer`](super::SvgRasterizer)

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use log::debug;
use tokio_util::sync::CancellationToken;

use crate::capability::{RasterEncoder, RendererOptions, SvgRenderer};
use crate::error::{Error, Result};
use crate::format::{EncodingFormat, RenderOptions};
use crate::raster::transformer::Transformer;

/// Quality requested from the general-purpose encoder
pub const ENCODER_QUALITY: u8 = 100;

/// One rasterization request
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub svg: Arc<[u8]>,
    pub format: EncodingFormat,
    pub options: Option<RenderOptions>,
    pub signal: Option<CancellationToken>,
}

/// A way of turning SVG into an encoded buffer
pub trait RasterBackend: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Whether this backend can produce `format`
    fn supports(&self, format: &EncodingFormat) -> bool;

    fn render(&self, job: RenderJob) -> BoxFuture<'_, Result<Vec<u8>>>;
}

/// Path through the general-purpose image toolkit.
///
/// Encodes at [`ENCODER_QUALITY`]; the job's options and cancellation token
/// are not forwarded.
pub struct EncoderBackend {
    encoder: Arc<dyn RasterEncoder>,
}

impl EncoderBackend {
    pub fn new(encoder: Arc<dyn RasterEncoder>) -> Self {
        Self { encoder }
    }
}

impl RasterBackend for EncoderBackend {
    fn name(&self) -> &'static str {
        "encoder"
    }

    fn supports(&self, format: &EncodingFormat) -> bool {
        self.encoder.supports(format)
    }

    fn render(&self, job: RenderJob) -> BoxFuture<'_, Result<Vec<u8>>> {
        let encoder = self.encoder.clone();
        async move {
            if job.options.is_some() || job.signal.is_some() {
                debug!("encoder backend ignores per-call options and cancellation");
            }
            let RenderJob { svg, format, .. } = job;
            tokio::task::spawn_blocking(move || encoder.encode(&svg, &format, ENCODER_QUALITY))
                .await?
        }
        .boxed()
    }
}

/// Path through the raw-pixel renderer plus [`Transformer`]
pub struct RendererBackend {
    renderer: Arc<dyn SvgRenderer>,
    options: RendererOptions,
}

impl RendererBackend {
    pub fn new(renderer: Arc<dyn SvgRenderer>, options: RendererOptions) -> Self {
        Self { renderer, options }
    }
}

impl RasterBackend for RendererBackend {
    fn name(&self) -> &'static str {
        "renderer"
    }

    fn supports(&self, format: &EncodingFormat) -> bool {
        format.is_builtin()
    }

    fn render(&self, job: RenderJob) -> BoxFuture<'_, Result<Vec<u8>>> {
        let renderer = self.renderer.clone();
        let options = self.options.clone();
        async move {
            let RenderJob {
                svg,
                format,
                options: encode_options,
                signal,
            } = job;

            let output =
                tokio::task::spawn_blocking(move || renderer.render(&svg, &options)).await??;

            match format {
                EncodingFormat::Raw => Ok(output.into_pixels()),
                EncodingFormat::Png => output.as_png(),
                EncodingFormat::Jpeg | EncodingFormat::Webp | EncodingFormat::Avif => {
                    let transformer = Transformer::from_rgba_pixels(
                        output.to_rgba(),
                        output.width(),
                        output.height(),
                    )?;
                    match format {
                        EncodingFormat::Avif => {
                            let config = encode_options.and_then(|o| o.avif().cloned());
                            transformer.avif(config, signal).await
                        }
                        EncodingFormat::Jpeg => {
                            let quality = encode_options.and_then(|o| o.quality());
                            transformer.jpeg(quality, signal).await
                        }
                        _ => {
                            let quality = encode_options.and_then(|o| o.quality());
                            transformer.webp(quality, signal).await
                        }
                    }
                }
                EncodingFormat::Other(name) => Err(Error::UnsupportedFormat(name)),
            }
        }
        .boxed()
    }
}
