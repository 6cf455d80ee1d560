//! Error types for rasterization and surface operations

use thiserror::Error;

/// Result type alias for canvasmith operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rasterizing, encoding or loading images
#[derive(Error, Debug)]
pub enum Error {
    /// No rendering capability is installed
    #[error("Missing dependency: {0} is required to render SVG")]
    MissingCapability(&'static str),

    /// The requested format has no encode path
    #[error("Unsupported encoding format: \"{0}\"")]
    UnsupportedFormat(String),

    /// Options were supplied for a different format than the one requested
    #[error("{options} options cannot be used with format \"{format}\"")]
    OptionsMismatch {
        /// Requested output format
        format: String,
        /// Format the options were built for
        options: &'static str,
    },

    /// Option values out of range
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// The cancellation token fired before the encode finished
    #[error("Operation cancelled")]
    Cancelled,

    /// SVG parsing failed
    #[cfg(feature = "resvg")]
    #[error("SVG error: {0}")]
    Svg(#[from] resvg::usvg::Error),

    /// Image decoding or encoding failed
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// PNG encoding failed
    #[error("PNG encoding error: {0}")]
    PngEncoding(#[from] png::EncodingError),

    /// libwebp rejected the lossy encode
    #[error("WebP encoding error: {0}")]
    WebpEncoding(String),

    /// I/O error (reading image sources)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error while fetching a remote image
    #[cfg(feature = "remote")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A blocking render or encode task panicked or was aborted
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Failed to produce pixels
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// The image source could not be interpreted
    #[error("Invalid image source: {0}")]
    InvalidSource(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
