//! Canonical result types shared by the orchestrator, the batch coordinator
//! and the renderers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata key holding the original filename.
pub const META_FILENAME: &str = "filename";
/// Metadata key holding the page count.
pub const META_PAGE_COUNT: &str = "page_count";

/// One detected table as a row/column grid, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableGrid {
    #[serde(rename = "data")]
    pub rows: Vec<Vec<String>>,
    pub headers: Option<Vec<String>>,
}

impl TableGrid {
    /// Wrap an exported grid. When `has_header` is set the first row becomes
    /// the header row.
    pub fn from_grid(mut grid: Vec<Vec<String>>, has_header: bool) -> Self {
        if has_header && !grid.is_empty() {
            let headers = grid.remove(0);
            Self {
                rows: grid,
                headers: Some(headers),
            }
        } else {
            Self {
                rows: grid,
                headers: None,
            }
        }
    }
}

/// The canonical extraction result every renderer consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub markdown: String,
    #[serde(default)]
    pub tables: Vec<TableGrid>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl ExtractionResult {
    /// The `filename` metadata entry, if present and a string.
    pub fn filename(&self) -> Option<&str> {
        self.metadata.get(META_FILENAME).and_then(Value::as_str)
    }

    /// The `page_count` metadata entry; 0 when absent.
    pub fn page_count(&self) -> u64 {
        self.metadata
            .get(META_PAGE_COUNT)
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }
}

/// Per-file status in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Success,
    Error,
}

/// Outcome of one file in a batch.
///
/// Serialised flat: `{filename, status, markdown?, tables?, metadata?, error?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFileOutcome {
    pub filename: String,
    pub status: FileStatus,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub result: Option<ExtractionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchFileOutcome {
    pub fn success(filename: impl Into<String>, result: ExtractionResult) -> Self {
        Self {
            filename: filename.into(),
            status: FileStatus::Success,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(filename: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            status: FileStatus::Error,
            result: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == FileStatus::Success
    }
}

/// Aggregated batch result.
///
/// Invariant: `successful + failed == total_files == outcomes.len()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    #[serde(rename = "results")]
    pub outcomes: Vec<BatchFileOutcome>,
    pub total_files: usize,
    pub successful: usize,
    pub failed: usize,
}

impl BatchResult {
    /// Tally outcomes into a result.
    pub fn from_outcomes(outcomes: Vec<BatchFileOutcome>) -> Self {
        let successful = outcomes.iter().filter(|o| o.is_success()).count();
        let total_files = outcomes.len();
        Self {
            outcomes,
            total_files,
            successful,
            failed: total_files - successful,
        }
    }
}
