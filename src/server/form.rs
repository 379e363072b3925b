//! Multipart form parsing shared by every extraction route.
//!
//! Recognised fields: `file` / `files` (uploads), `ocr_enabled`,
//! `table_extraction_enabled`, `vlm_mode`, `vlm_model_id`. Unknown fields are
//! ignored. Booleans accept `true/false`, `1/0`, `yes/no`, `on/off`.

use super::error::ApiError;
use crate::batch::BatchInput;
use crate::error::ExtractError;
use crate::options::{ExtractionOptions, VlmMode};
use axum::extract::Multipart;
use tracing::debug;

/// One uploaded file part.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// The filename, or [`ExtractError::MissingFilename`] when absent/blank.
    pub fn require_filename(&self) -> Result<&str, ExtractError> {
        self.filename
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .ok_or(ExtractError::MissingFilename)
    }
}

impl From<UploadedFile> for BatchInput {
    fn from(file: UploadedFile) -> Self {
        BatchInput {
            bytes: file.bytes,
            filename: file.filename,
        }
    }
}

/// Parsed extraction form.
#[derive(Debug, Default)]
pub struct ExtractForm {
    pub files: Vec<UploadedFile>,
    pub options: ExtractionOptions,
}

impl ExtractForm {
    /// Read every field of `multipart`.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = ExtractForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read multipart field: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" | "files" => {
                    let filename = field.file_name().map(str::to_string);
                    let bytes = field.bytes().await.map_err(|e| {
                        ApiError::bad_request(format!("Failed to read uploaded file: {}", e))
                    })?;
                    debug!("Received upload {:?} ({} bytes)", filename, bytes.len());
                    form.files.push(UploadedFile {
                        filename,
                        bytes: bytes.to_vec(),
                    });
                }
                "ocr_enabled" => form.options.ocr_enabled = parse_bool(&name, &text(field).await?)?,
                "table_extraction_enabled" => {
                    form.options.table_extraction_enabled = parse_bool(&name, &text(field).await?)?
                }
                "vlm_mode" => {
                    form.options.vlm_mode = text(field)
                        .await?
                        .parse::<VlmMode>()
                        .map_err(ApiError::bad_request)?
                }
                "vlm_model_id" => form.options.vlm_model_id = Some(text(field).await?),
                other => debug!("Ignoring unknown form field '{}'", other),
            }
        }

        Ok(form)
    }

    /// The single uploaded file of a one-document request.
    pub fn single_file(mut self) -> Result<(UploadedFile, ExtractionOptions), ApiError> {
        if self.files.is_empty() {
            return Err(ApiError::bad_request("Field 'file' is required"));
        }
        Ok((self.files.swap_remove(0), self.options))
    }
}

async fn text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    let name = field.name().unwrap_or_default().to_string();
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid value for '{}': {}", name, e)))
}

/// Parse a form boolean.
pub fn parse_bool(field: &str, value: &str) -> Result<bool, ApiError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ApiError::bad_request(format!(
            "Invalid boolean for '{}': '{}'",
            field, other
        ))),
    }
}
