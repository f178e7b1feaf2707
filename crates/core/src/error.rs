//! Error types for the hairpiece-core library.
//!
//! Only input validation and the image-generation call can fail. The ad
//! gateway never returns an error: an ad that fails to show must never
//! block the edit itself, so every gate path resolves through callbacks.

use thiserror::Error;

/// Errors that can occur within the hairpiece-core library.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (missing keys, invalid values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required environment variable was not found.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// The user-supplied photo or description is unusable.
    ///
    /// Raised before any gate or generation call is made.
    #[error("{0}")]
    MalformedInput(String),

    /// Image inspection or encoding failed.
    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    /// General Gemini API error.
    #[error("Gemini API error: {0}")]
    GeminiApi(String),

    /// The model answered but returned no image part.
    #[error("No image generated in response")]
    NoImageGenerated,

    /// The generation collaborator failed; the message is shown to the user.
    #[error("Failed to generate image: {0}")]
    Generation(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an input validation error with the given message.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    /// Creates an image processing error with the given message.
    pub fn image(msg: impl Into<String>) -> Self {
        Self::ImageProcessing(msg.into())
    }

    /// Creates a Gemini API error with the given message.
    pub fn gemini(msg: impl Into<String>) -> Self {
        Self::GeminiApi(msg.into())
    }

    /// Wraps any failure of the generation call into a user-facing error.
    ///
    /// Already-wrapped errors are passed through unchanged so the message
    /// is never prefixed twice.
    pub fn generation(err: AppError) -> Self {
        match err {
            Self::Generation(_) => err,
            other => Self::Generation(other.to_string()),
        }
    }
}

/// A convenient alias for Result with [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
