//! General-purpose image toolkit capability.
//!
//! Loads SVG with system fonts available, then hands the pixels to the
//! `image` crate's encoders. Besides the built-in formats it can write any
//! format `image` was compiled with (gif, bmp).

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::capability::{native, RasterEncoder, RenderedSvg};
use crate::error::{Error, Result};
use crate::format::{AvifConfig, EncodingFormat};
use crate::raster::transformer;

#[derive(Debug, Clone, Copy, Default)]
pub struct ImageToolkit;

impl ImageToolkit {
    pub fn new() -> Self {
        ImageToolkit
    }

    fn writable(name: &str) -> Option<ImageFormat> {
        ImageFormat::from_extension(name).filter(|f| f.writing_enabled())
    }
}

impl RasterEncoder for ImageToolkit {
    fn supports(&self, format: &EncodingFormat) -> bool {
        match format {
            EncodingFormat::Other(name) => Self::writable(name).is_some(),
            _ => true,
        }
    }

    fn encode(&self, svg: &[u8], format: &EncodingFormat, quality: u8) -> Result<Vec<u8>> {
        let rendered = RenderedSvg::new(native::rasterize(svg, true)?);
        let (width, height) = (rendered.width(), rendered.height());
        let rgba = RgbaImage::from_raw(width, height, rendered.to_rgba()).ok_or_else(|| {
            Error::RenderError(format!("pixel buffer does not fit {}x{}", width, height))
        })?;

        match format {
            EncodingFormat::Raw => Ok(rgba.into_raw()),
            EncodingFormat::Png => transformer::encode_png(&rgba),
            EncodingFormat::Jpeg => transformer::encode_jpeg(&rgba, quality),
            EncodingFormat::Webp => transformer::encode_webp(&rgba, Some(quality)),
            EncodingFormat::Avif => transformer::encode_avif(
                &rgba,
                &AvifConfig {
                    quality: Some(quality),
                    ..Default::default()
                },
            ),
            EncodingFormat::Other(name) => {
                let target = Self::writable(name)
                    .ok_or_else(|| Error::UnsupportedFormat(name.clone()))?;
                let mut buf = Vec::new();
                DynamicImage::ImageRgba8(rgba).write_to(&mut Cursor::new(&mut buf), target)?;
                Ok(buf)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOT: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"><circle cx="2" cy="2" r="2" fill="red"/></svg>"#;

    #[test]
    fn supports_builtin_and_writable_formats() {
        let toolkit = ImageToolkit::new();
        assert!(toolkit.supports(&EncodingFormat::Raw));
        assert!(toolkit.supports(&EncodingFormat::from("gif")));
        assert!(!toolkit.supports(&EncodingFormat::from("svgz")));
    }

    #[test]
    fn encodes_gif_through_image() {
        let out = ImageToolkit::new()
            .encode(DOT.as_bytes(), &EncodingFormat::from("gif"), 100)
            .unwrap();
        assert_eq!(&out[0..3], b"GIF");
    }

    #[test]
    fn raw_output_is_straight_rgba() {
        let out = ImageToolkit::new()
            .encode(DOT.as_bytes(), &EncodingFormat::Raw, 100)
            .unwrap();
        assert_eq!(out.len(), 4 * 4 * 4);
    }
}
