//! Error types for the docex-serve library.
//!
//! Two distinct error types reflect two distinct sides of the engine boundary:
//!
//! * [`ExtractError`] (**orchestration**): the request cannot be served
//!   (missing filename, unsupported extension, provider misconfigured, the
//!   engine failed, the saved file could not be written). Returned from
//!   [`crate::extract::Extractor`] and mapped onto HTTP status codes by the
//!   server layer.
//!
//! * [`EngineError`] (**collaborator**): raised inside a
//!   [`crate::engine::ConversionEngine`]. The orchestrator wraps it into
//!   [`ExtractError::Conversion`] so callers only ever match one type.
//!
//! A missing VLM credential is deliberately *not* an error: it is recorded as
//! [`crate::pipeline::VlmStatus::Disabled`] and logged.

use crate::providers::ProviderError;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the extraction layer.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// The upload carried no filename (or an empty one).
    #[error("No filename provided")]
    MissingFilename,

    /// The filename's extension does not map to a supported input format.
    #[error("Unsupported file type '{extension}' for '{filename}'\nSupported: pdf, png, jpg, jpeg, md, markdown, txt")]
    UnsupportedFormat { filename: String, extension: String },

    /// A local input path does not exist.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    // ── Provider errors ───────────────────────────────────────────────────
    /// VLM provider could not be resolved to an endpoint.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    // ── Engine errors ─────────────────────────────────────────────────────
    /// The conversion engine failed on this document.
    #[error("Conversion failed for '{filename}': {source}")]
    Conversion {
        filename: String,
        #[source]
        source: EngineError,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not stage the upload in a temporary file.
    #[error("Failed to stage '{filename}' for conversion: {source}")]
    TempFile {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the saved Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Settings validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ExtractError {
    /// True for errors caused by the request itself rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ExtractError::MissingFilename
                | ExtractError::UnsupportedFormat { .. }
                | ExtractError::FileNotFound { .. }
        )
    }
}

/// Errors raised by a conversion engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or place the library next to the binary."
    )]
    PdfiumBinding(String),

    /// The document could not be parsed.
    #[error("Document is corrupt or unreadable: {0}")]
    CorruptDocument(String),

    /// The document is password protected.
    #[error("Document is encrypted and requires a password")]
    PasswordRequired,

    /// An image could not be decoded or encoded.
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),

    /// Page rasterisation failed.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// OCR backend is not installed.
    #[error("OCR backend not available: {0}")]
    OcrUnavailable(String),

    /// OCR backend ran but failed.
    #[error("OCR failed: {0}")]
    OcrFailed(String),

    /// Picture-description endpoint returned an error.
    #[error("Picture description request to '{url}' failed: {detail}")]
    PictureDescription { url: String, detail: String },

    /// API picture description requested without remote services enabled.
    #[error("Picture description via a remote API requires enable_remote_services")]
    RemoteServicesDisabled,

    /// Any I/O failure while reading the input.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected internal error.
    #[error("Internal engine error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_filename_display() {
        assert_eq!(ExtractError::MissingFilename.to_string(), "No filename provided");
    }

    #[test]
    fn conversion_display_carries_engine_message() {
        let e = ExtractError::Conversion {
            filename: "scan.pdf".into(),
            source: EngineError::CorruptDocument("bad xref".into()),
        };
        let msg = e.to_string();
        assert!(msg.contains("scan.pdf"), "got: {msg}");
        assert!(msg.contains("bad xref"), "got: {msg}");
    }

    #[test]
    fn unsupported_format_is_client_error() {
        let e = ExtractError::UnsupportedFormat {
            filename: "a.exe".into(),
            extension: "exe".into(),
        };
        assert!(e.is_client_error());
        assert!(e.to_string().contains("exe"));
    }

    #[test]
    fn provider_error_is_server_error() {
        let e: ExtractError = ProviderError::UnknownProvider {
            provider: "acme".into(),
            known: "openai".into(),
        }
        .into();
        assert!(!e.is_client_error());
        assert!(e.to_string().contains("acme"));
    }

    #[test]
    fn remote_services_display() {
        let e = EngineError::RemoteServicesDisabled;
        assert!(e.to_string().contains("enable_remote_services"));
    }
}
