//! Boundary to the document conversion engine.
//!
//! The orchestration layer never parses documents itself. It talks to an
//! engine through three narrow traits:
//!
//! ```text
//! EngineFactory ──create(config)──▶ ConversionEngine ──convert(path)──▶ ConvertedDocument
//!                                                                         ├─ tables()
//!                                                                         ├─ export_markdown(placeholder)
//!                                                                         └─ page_count()
//! ```
//!
//! A factory builds a fresh engine for every [`PipelineConfiguration`]; engines
//! are never reused across requests. [`StandardEngineFactory`] is the bundled
//! implementation (pdfium text layer, tesseract OCR, OpenAI-compatible picture
//! description); tests and embedders can plug in their own.

pub mod describe;
pub mod document;
pub mod encode;
pub mod ocr;
pub mod pdf;
pub mod standard;
pub mod tables;

use crate::error::EngineError;
use crate::pipeline::PipelineConfiguration;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

pub use document::{Block, EngineDocument, Page};
pub use standard::{StandardEngine, StandardEngineFactory};

/// Input formats the engine accepts, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Pdf,
    Image,
    Markdown,
    Text,
}

impl InputFormat {
    /// Map a file extension (without the dot, any case) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "png" | "jpg" | "jpeg" => Some(Self::Image),
            "md" | "markdown" => Some(Self::Markdown),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }

    /// Map a filename to a format via its extension.
    pub fn from_filename(filename: &str) -> Option<Self> {
        Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// A table as exported by the engine: every row, header row included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectedTable {
    pub cells: Vec<Vec<String>>,
    /// Whether the first row of `cells` is a header row.
    pub has_header: bool,
}

impl DetectedTable {
    /// Export the table as a row/column grid.
    pub fn export_to_grid(&self) -> Vec<Vec<String>> {
        self.cells.clone()
    }
}

/// Page count as reported by an engine: either a value or a zero-argument
/// accessor, and not necessarily numeric.
pub enum RawPageCount {
    Value(Value),
    Accessor(Box<dyn FnOnce() -> Value + Send>),
}

impl RawPageCount {
    /// Resolve to a plain non-negative integer; anything non-numeric is 0.
    pub fn resolve(self) -> usize {
        let value = match self {
            RawPageCount::Value(v) => v,
            RawPageCount::Accessor(f) => f(),
        };
        coerce_page_count(&value)
    }
}

impl From<usize> for RawPageCount {
    fn from(n: usize) -> Self {
        RawPageCount::Value(Value::from(n))
    }
}

fn coerce_page_count(value: &Value) -> usize {
    if let Some(n) = value.as_u64() {
        return n as usize;
    }
    match value.as_f64() {
        Some(f) if f.is_finite() && f > 0.0 => f.trunc() as usize,
        _ => 0,
    }
}

/// A converted document.
pub trait ConvertedDocument: Send {
    /// Detected tables in document order.
    fn tables(&self) -> &[DetectedTable];

    /// Markdown with `page_break_placeholder` inserted between pages.
    fn export_markdown(&self, page_break_placeholder: &str) -> String;

    /// Number of pages.
    fn page_count(&self) -> RawPageCount;
}

/// An engine bound to one pipeline configuration.
#[async_trait]
pub trait ConversionEngine: Send + Sync {
    async fn convert(
        &self,
        path: &Path,
        format: InputFormat,
    ) -> Result<Box<dyn ConvertedDocument>, EngineError>;
}

/// Creates a fresh engine per configuration.
pub trait EngineFactory: Send + Sync {
    fn create(&self, config: &PipelineConfiguration) -> Result<Box<dyn ConversionEngine>, EngineError>;
}
