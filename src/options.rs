//! Per-request extraction options.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Literal some API explorers submit for an untouched optional text field.
pub const PLACEHOLDER_MODEL_ID: &str = "string";

/// How pictures inside the document get described.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VlmMode {
    /// No picture description. (default)
    #[default]
    None,
    /// A locally hosted vision model.
    Local,
    /// A remote provider from the registry.
    Api,
}

impl fmt::Display for VlmMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VlmMode::None => write!(f, "none"),
            VlmMode::Local => write!(f, "local"),
            VlmMode::Api => write!(f, "api"),
        }
    }
}

impl FromStr for VlmMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(VlmMode::None),
            "local" => Ok(VlmMode::Local),
            "api" => Ok(VlmMode::Api),
            other => Err(format!(
                "invalid vlm_mode '{other}': expected one of none, local, api"
            )),
        }
    }
}

/// Options for one extraction request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionOptions {
    pub ocr_enabled: bool,
    pub table_extraction_enabled: bool,
    pub vlm_mode: VlmMode,
    pub vlm_model_id: Option<String>,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            ocr_enabled: true,
            table_extraction_enabled: true,
            vlm_mode: VlmMode::None,
            vlm_model_id: None,
        }
    }
}

impl ExtractionOptions {
    /// Options with OCR, tables and the given VLM settings all enabled, as
    /// used by warmup.
    pub fn everything(vlm_mode: VlmMode, vlm_model_id: Option<String>) -> Self {
        Self {
            ocr_enabled: true,
            table_extraction_enabled: true,
            vlm_mode,
            vlm_model_id,
        }
    }

    /// The caller's model id, unless missing, blank or the placeholder literal.
    pub fn explicit_model_id(&self) -> Option<&str> {
        self.vlm_model_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty() && *id != PLACEHOLDER_MODEL_ID)
    }
}
