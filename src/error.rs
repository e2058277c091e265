//! Error types for the notedown library.

use std::io;
use thiserror::Error;

/// Result type alias for notedown operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during content conversion.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport-level error talking to the content source or downloading assets.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The content source rejected a request.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// An asset or link URL could not be parsed.
    #[error("Malformed URL: {0}")]
    MalformedUrl(String),

    /// No template is registered for a block kind.
    #[error("No template for block kind: {0}")]
    TemplateNotFound(String),

    /// Error during markdown rendering.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Configuration file could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error decoding a wire payload.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error decoding the configuration file.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}
