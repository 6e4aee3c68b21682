// Error types module

use thiserror::Error;

/// Centralized error type for the watermark pipeline.
///
/// Every variant carries owned strings so the error is `Clone`; a memoized
/// pipeline hands the same failure to every awaiting caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WatermarkError {
    /// A resource could not be fetched or read (bad locator, I/O, HTTP status).
    #[error("Failed to load resource '{resource}': {message}")]
    Load { resource: String, message: String },

    /// Bytes could not be decoded into an image (or base64 payload).
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// A terminal step needed a `data:<type>;base64,<payload>` string and got something else.
    #[error("Malformed data URL")]
    MalformedDataUrl,

    /// A surface could not be encoded to the requested output format.
    #[error("Failed to encode to {format}: {message}")]
    Encode { format: String, message: String },

    /// A draw step was requested over an empty resource list.
    #[error("Nothing to draw: the pipeline resolved to zero images")]
    NothingToDraw,

    /// Font bytes could not be read or parsed.
    #[error("Failed to load font: {0}")]
    Font(String),

    /// Invalid options, YAML or environment substitution.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl WatermarkError {
    pub fn load(resource: impl Into<String>, message: impl ToString) -> Self {
        Self::Load {
            resource: resource.into(),
            message: message.to_string(),
        }
    }

    pub fn decode(message: impl ToString) -> Self {
        Self::Decode(message.to_string())
    }

    pub fn encode(format: impl Into<String>, message: impl ToString) -> Self {
        Self::Encode {
            format: format.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WatermarkError>;
