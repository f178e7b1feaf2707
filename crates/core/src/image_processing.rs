//! Photo validation and encoding utilities.
//!
//! This module prepares user photos for transmission to the Gemini API and
//! turns the model's inline image answer back into bytes that can be
//! written to disk.
//!
//! # Data URLs
//!
//! Generated images travel as `data:<mime>;base64,<payload>` strings, the
//! same shape a browser would hand to an `<img>` tag. [`GeneratedImage`]
//! converts to and from that representation.

use crate::error::{AppError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::ImageFormat;
use std::path::Path;

/// Largest photo accepted for upload ("PNG, JPG up to 10MB").
pub const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

/// A user photo ready to be sent to the generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Photo {
    bytes: Vec<u8>,
    mime_type: String,
}

impl Photo {
    /// Reads and validates a photo from disk.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`] if the file cannot be read, or
    /// [`AppError::MalformedInput`] if the content is not an accepted image.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(bytes)
    }

    /// Validates raw bytes and sniffs their MIME type from the magic number.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::MalformedInput`] if the buffer is empty, larger
    /// than [`MAX_PHOTO_BYTES`], or not a recognised image format.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(AppError::malformed("The selected photo is empty"));
        }
        if bytes.len() > MAX_PHOTO_BYTES {
            return Err(AppError::malformed(format!(
                "Photo is {} bytes, the limit is 10MB",
                bytes.len()
            )));
        }

        let format = image::guess_format(&bytes)
            .map_err(|_| AppError::malformed("The selected file is not a supported image"))?;

        Ok(Self {
            bytes,
            mime_type: format.to_mime_type().to_string(),
        })
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Base64 payload for an inline-data request part.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }
}

/// An edited image returned by the generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    /// Base64-encoded image payload, exactly as the API returned it.
    pub data: String,
}

impl GeneratedImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Renders the image as a `data:` URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Parses a `data:<mime>;base64,<payload>` URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ImageProcessing`] if the URL is not a base64
    /// data URL.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| AppError::image("Not a data URL"))?;
        let (meta, data) = rest
            .split_once(',')
            .ok_or_else(|| AppError::image("Data URL has no payload"))?;
        let mime_type = meta
            .strip_suffix(";base64")
            .ok_or_else(|| AppError::image("Data URL is not base64 encoded"))?;

        Ok(Self::new(mime_type, data))
    }

    /// Decodes the base64 payload into raw image bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(self.data.as_bytes())
            .map_err(|e| AppError::image(format!("Failed to decode image payload: {}", e)))
    }

    /// Preferred file extension for the image's MIME type.
    ///
    /// Falls back to `png`, which is what the image model returns in
    /// practice.
    pub fn extension(&self) -> &'static str {
        ImageFormat::from_mime_type(&self.mime_type)
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or("png")
    }

    /// Decodes the payload and writes it to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.decode()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}
