//! Image loading for drawing surfaces

use std::path::{Path, PathBuf};

use base64::Engine as Base64Engine;
use log::debug;
use tiny_skia::{ColorU8, IntSize, Pixmap};
use url::Url;

use crate::capability::{CapabilityKind, CapabilityLoader};
use crate::error::{Error, Result};
use crate::RasterConfig;

/// Where to load an image from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Encoded image bytes (PNG, JPEG, WebP, AVIF, GIF, BMP or SVG)
    Bytes(Vec<u8>),
    Path(PathBuf),
    /// `data:`, `file:`, or (feature `remote`) `http(s):` URL
    Url(Url),
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(bytes)
    }
}

impl From<&[u8]> for ImageSource {
    fn from(bytes: &[u8]) -> Self {
        ImageSource::Bytes(bytes.to_vec())
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        ImageSource::Path(path.to_path_buf())
    }
}

impl From<Url> for ImageSource {
    fn from(url: Url) -> Self {
        ImageSource::Url(url)
    }
}

impl From<&str> for ImageSource {
    /// URLs with a `data`, `file`, `http` or `https` scheme become
    /// [`ImageSource::Url`]; anything else is treated as a path.
    fn from(s: &str) -> Self {
        match Url::parse(s) {
            Ok(url) if matches!(url.scheme(), "data" | "file" | "http" | "https") => {
                ImageSource::Url(url)
            }
            _ => ImageSource::Path(PathBuf::from(s)),
        }
    }
}

impl From<String> for ImageSource {
    fn from(s: String) -> Self {
        ImageSource::from(s.as_str())
    }
}

/// A decoded image as straight RGBA pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Premultiplied copy suitable for drawing onto a surface's context
    pub fn to_pixmap(&self) -> Option<Pixmap> {
        let size = IntSize::from_wh(self.width, self.height)?;
        let mut data = Vec::with_capacity(self.pixels.len());
        for px in self.pixels.chunks_exact(4) {
            let c = ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Pixmap::from_vec(data, size)
    }
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(256)];
    let text = String::from_utf8_lossy(head);
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    trimmed.starts_with("<svg") || trimmed.starts_with("<?xml") || trimmed.starts_with("<!DOCTYPE svg")
}

fn decode_data_url(url: &Url) -> Result<Vec<u8>> {
    let raw = url.as_str();
    let rest = raw.strip_prefix("data:").unwrap_or(raw);
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::InvalidSource("data URL without payload".to_string()))?;

    if !header.ends_with(";base64") {
        return Err(Error::InvalidSource(
            "only base64 data URLs are supported".to_string(),
        ));
    }

    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| Error::InvalidSource(format!("bad base64 payload: {}", e)))
}

#[cfg(feature = "remote")]
async fn fetch(url: &Url) -> Result<Vec<u8>> {
    let res = reqwest::get(url.clone()).await?.error_for_status()?;
    Ok(res.bytes().await?.to_vec())
}

#[cfg(not(feature = "remote"))]
async fn fetch(url: &Url) -> Result<Vec<u8>> {
    Err(Error::InvalidSource(format!(
        "cannot fetch {}: built without the `remote` feature",
        url
    )))
}

async fn read_source(source: ImageSource) -> Result<Vec<u8>> {
    match source {
        ImageSource::Bytes(bytes) => Ok(bytes),
        ImageSource::Path(path) => Ok(tokio::fs::read(&path).await?),
        ImageSource::Url(url) => match url.scheme() {
            "data" => decode_data_url(&url),
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| Error::InvalidSource(format!("not a local file URL: {}", url)))?;
                Ok(tokio::fs::read(&path).await?)
            }
            "http" | "https" => fetch(&url).await,
            other => Err(Error::InvalidSource(format!("unsupported URL scheme: {}", other))),
        },
    }
}

/// Read and decode an image.
///
/// SVG input is rasterized through the SVG renderer capability; every other
/// format goes through `image`.
pub async fn load_image(source: impl Into<ImageSource>) -> Result<DecodedImage> {
    let bytes = read_source(source.into()).await?;
    debug!("decoding {} bytes of image data", bytes.len());

    if looks_like_svg(&bytes) {
        let renderer = CapabilityLoader::global()
            .svg_renderer()
            .ok_or(Error::MissingCapability(CapabilityKind::Renderer.name()))?;
        let options = RasterConfig::from_env().renderer;
        let rendered =
            tokio::task::spawn_blocking(move || renderer.render(&bytes, &options)).await??;
        return Ok(DecodedImage {
            width: rendered.width(),
            height: rendered.height(),
            pixels: rendered.to_rgba(),
        });
    }

    tokio::task::spawn_blocking(move || {
        let rgba = image::load_from_memory(&bytes)?.to_rgba8();
        Ok(DecodedImage {
            width: rgba.width(),
            height: rgba.height(),
            pixels: rgba.into_raw(),
        })
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_classify_into_sources() {
        assert!(matches!(ImageSource::from("data:image/png;base64,AA=="), ImageSource::Url(_)));
        assert!(matches!(ImageSource::from("https://example.com/a.png"), ImageSource::Url(_)));
        assert!(matches!(ImageSource::from("assets/a.png"), ImageSource::Path(_)));
        assert!(matches!(ImageSource::from("C:/images/a.png"), ImageSource::Path(_)));
    }

    #[test]
    fn detects_svg_markup() {
        assert!(looks_like_svg(b"  <svg xmlns='http://www.w3.org/2000/svg'/>"));
        assert!(looks_like_svg(b"<?xml version=\"1.0\"?><svg/>"));
        assert!(!looks_like_svg(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn data_url_must_be_base64() {
        let url = Url::parse("data:text/plain,hello").unwrap();
        assert!(matches!(decode_data_url(&url), Err(Error::InvalidSource(_))));

        let url = Url::parse("data:application/octet-stream;base64,AQID").unwrap();
        assert_eq!(decode_data_url(&url).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn to_pixmap_premultiplies() {
        let img = DecodedImage {
            width: 1,
            height: 1,
            pixels: vec![255, 255, 255, 0],
        };
        let pixmap = img.to_pixmap().unwrap();
        assert_eq!(pixmap.data(), &[0, 0, 0, 0]);
    }
}
