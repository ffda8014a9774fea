//! Error types for CODEX extraction

use std::fmt;
use std::io;

use crate::tiff::errors::TiffError;

/// Errors raised while resolving or running an extraction
#[derive(Debug)]
pub enum CodexError {
    /// I/O error
    IoError(io::Error),
    /// Error from the TIFF layer
    Tiff(TiffError),
    /// Raw image could not be decoded
    ImageError(String),
    /// Channel name without a recognized source prefix
    InvalidChannelPrefix {
        channel: String,
        valid_prefixes: Vec<&'static str>,
    },
    /// Channel name not present in the configuration or cytometry table
    UnknownChannel(String),
    /// Z selector that cannot be interpreted
    InvalidZSelector(String),
    /// Malformed index expression
    InvalidIndexExpression(String),
    /// Missing or invalid experiment configuration value
    ConfigError(String),
    /// No best focal plane recorded for a tile location
    MissingBestFocus {
        region_index: usize,
        tile_x: usize,
        tile_y: usize,
    },
    /// Arrays that must share a shape do not
    DimensionMismatch(String),
    /// Cycle, z or channel index outside of a tile
    IndexOutOfRange(String),
}

impl fmt::Display for CodexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodexError::IoError(e) => write!(f, "I/O error: {}", e),
            CodexError::Tiff(e) => write!(f, "{}", e),
            CodexError::ImageError(msg) => write!(f, "Image decode error: {}", msg),
            CodexError::InvalidChannelPrefix { channel, valid_prefixes } => write!(
                f,
                "Channel with name \"{}\" is not valid.  Must start with one of the following: {:?}",
                channel, valid_prefixes
            ),
            CodexError::UnknownChannel(msg) => write!(f, "Unknown channel: {}", msg),
            CodexError::InvalidZSelector(z) => write!(
                f,
                "Z slice cannot be defined as empty or invalid value (given = \"{}\")",
                z
            ),
            CodexError::InvalidIndexExpression(msg) => write!(f, "Invalid index expression: {}", msg),
            CodexError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            CodexError::MissingBestFocus { region_index, tile_x, tile_y } => write!(
                f,
                "No best focus plane recorded for region {}, tile x {}, tile y {}",
                region_index, tile_x, tile_y
            ),
            CodexError::DimensionMismatch(msg) => write!(f, "Dimension mismatch: {}", msg),
            CodexError::IndexOutOfRange(msg) => write!(f, "Index out of range: {}", msg),
        }
    }
}

impl std::error::Error for CodexError {}

impl From<io::Error> for CodexError {
    fn from(error: io::Error) -> Self {
        CodexError::IoError(error)
    }
}

impl From<TiffError> for CodexError {
    fn from(error: TiffError) -> Self {
        match error {
            TiffError::IoError(e) => CodexError::IoError(e),
            other => CodexError::Tiff(other),
        }
    }
}

impl From<image::ImageError> for CodexError {
    fn from(error: image::ImageError) -> Self {
        CodexError::ImageError(error.to_string())
    }
}

/// Result type for extraction operations
pub type CodexResult<T> = Result<T, CodexError>;
