//! Encoded image buffers and data URL helpers

use base64::Engine as Base64Engine;

const SVG_MIME: &str = "image/svg+xml";

fn encode_base64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// An encoded image buffer paired with its MIME type.
///
/// # Examples
///
/// ```
/// use canvasmith::ImageResult;
///
/// let img = ImageResult::new(vec![1, 2, 3], "image/png");
/// assert_eq!(img.to_base64(), "AQID");
/// assert_eq!(img.to_data_url(), "data:image/png;base64,AQID");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResult {
    data: Vec<u8>,
    mime: String,
}

impl ImageResult {
    pub fn new(data: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            data,
            mime: mime.into(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn to_base64(&self) -> String {
        encode_base64(&self.data)
    }

    /// RFC 2397 data URL: `data:{mime};base64,{payload}`
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.to_base64())
    }
}

/// Embed SVG source as an `image/svg+xml` data URL without rasterizing it
pub fn svg_data_url(svg: impl AsRef<[u8]>) -> String {
    format!("data:{};base64,{}", SVG_MIME, encode_base64(svg.as_ref()))
}
