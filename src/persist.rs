//! Writing extraction results to the storage directory.

use crate::error::ExtractError;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::info;

/// `{stem}_{YYYYMMDD_HHMMSS}.md` for `original_filename` at `at`.
pub fn output_filename(original_filename: &str, at: DateTime<Local>) -> String {
    let stem = Path::new(original_filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("document");
    format!("{}_{}.md", stem, at.format("%Y%m%d_%H%M%S"))
}

/// Save `markdown` under `storage_dir` and return the absolute path.
///
/// The directory is created if needed. A file saved within the same second
/// for the same stem overwrites the previous one.
pub async fn save_markdown(
    storage_dir: &Path,
    markdown: &str,
    original_filename: &str,
) -> Result<PathBuf, ExtractError> {
    let write_failed = |path: &Path, source| ExtractError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    tokio::fs::create_dir_all(storage_dir)
        .await
        .map_err(|e| write_failed(storage_dir, e))?;

    let target = storage_dir.join(output_filename(original_filename, Local::now()));
    tokio::fs::write(&target, markdown.as_bytes())
        .await
        .map_err(|e| write_failed(&target, e))?;

    let absolute = std::path::absolute(&target).map_err(|e| write_failed(&target, e))?;
    info!("Saved extraction to {}", absolute.display());
    Ok(absolute)
}
