//! Error types for badge rendering and printing

use thiserror::Error;

/// Result type alias for library operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, rendering or printing badges
#[derive(Error, Debug)]
pub enum Error {
    /// Logo or other image asset could not be loaded
    #[error("Failed to load asset {path}: {reason}")]
    Asset { path: String, reason: String },

    /// Font file missing or not a usable TrueType font
    #[error("Failed to load font {0}")]
    Font(String),

    /// Malformed participant file
    #[error("Invalid input: {0}")]
    Input(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Failed to compose a label
    #[error("Rendering failed: {0}")]
    Render(String),

    /// Image could not be turned into raster instructions
    #[error("Raster conversion failed: {0}")]
    Conversion(String),

    /// Device could not be opened or written
    #[error("Printer transport error: {0}")]
    Transport(String),

    /// Printer reported an error or sent an unreadable status
    #[error("Printer status: {0}")]
    Status(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(feature = "usb")]
impl From<rusb::Error> for Error {
    fn from(err: rusb::Error) -> Self {
        Error::Transport(err.to_string())
    }
}
