//! Re-encode raw RGBA pixels into compressed formats.
//!
//! Encoding runs on the blocking pool. When a cancellation token is supplied
//! and fires first, the call resolves with [`Error::Cancelled`] and the
//! encode result is discarded.

use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};
use log::debug;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::format::AvifConfig;

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Stateless adapter from a pixel buffer to encoded bytes
#[derive(Debug, Clone)]
pub struct Transformer {
    image: RgbaImage,
}

impl Transformer {
    /// Wrap straight RGBA pixels. Fails if the buffer does not hold exactly
    /// `width * height` pixels.
    pub fn from_rgba_pixels(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let image = RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
            Error::RenderError(format!("pixel buffer does not fit {}x{}", width, height))
        })?;
        Ok(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub async fn jpeg(self, quality: Option<u8>, signal: Option<CancellationToken>) -> Result<Vec<u8>> {
        let quality = quality.unwrap_or(DEFAULT_JPEG_QUALITY);
        self.run(signal, move |img| encode_jpeg(&img, quality)).await
    }

    pub async fn webp(self, quality: Option<u8>, signal: Option<CancellationToken>) -> Result<Vec<u8>> {
        self.run(signal, move |img| encode_webp(&img, quality)).await
    }

    pub async fn avif(
        self,
        config: Option<AvifConfig>,
        signal: Option<CancellationToken>,
    ) -> Result<Vec<u8>> {
        let config = config.unwrap_or_default();
        self.run(signal, move |img| encode_avif(&img, &config)).await
    }

    async fn run<F>(self, signal: Option<CancellationToken>, encode: F) -> Result<Vec<u8>>
    where
        F: FnOnce(RgbaImage) -> Result<Vec<u8>> + Send + 'static,
    {
        let image = self.image;
        match signal {
            None => tokio::task::spawn_blocking(move || encode(image)).await?,
            Some(token) => {
                if token.is_cancelled() {
                    return Err(Error::Cancelled);
                }
                let task = tokio::task::spawn_blocking(move || encode(image));
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(Error::Cancelled),
                    res = task => res?,
                }
            }
        }
    }
}

pub(crate) fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(buf)
}

pub(crate) fn encode_jpeg(img: &RgbaImage, quality: u8) -> Result<Vec<u8>> {
    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).write_image(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(buf)
}

/// Lossy libwebp encode at `quality`, or lossless through `image` when no
/// quality is given.
pub(crate) fn encode_webp(img: &RgbaImage, quality: Option<u8>) -> Result<Vec<u8>> {
    if let Some(q) = quality {
        let encoded = webp::Encoder::from_rgba(img.as_raw(), img.width(), img.height())
            .encode_simple(false, f32::from(q.clamp(1, 100)))
            .map_err(|e| Error::WebpEncoding(format!("{:?}", e)))?;
        return Ok(encoded.to_vec());
    }

    debug!("no webp quality given; encoding lossless");
    let mut buf = Vec::new();
    WebPEncoder::new_lossless(&mut buf).write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(buf)
}

pub(crate) fn encode_avif(img: &RgbaImage, config: &AvifConfig) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    AvifEncoder::new_with_speed_quality(
        &mut buf,
        config.speed_or_default(),
        config.quality_or_default(),
    )
    .with_num_threads(Some(config.threads_or_default()))
    .write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(buf)
}
