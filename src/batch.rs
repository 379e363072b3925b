//! Batch coordinator: run several uploads through one [`Extractor`],
//! sequentially and in input order, collecting per-file outcomes.
//!
//! A failing file never aborts the batch; it becomes an error outcome.

use crate::error::ExtractError;
use crate::extract::Extractor;
use crate::options::ExtractionOptions;
use crate::output::{BatchFileOutcome, BatchResult};
use tracing::{error, info};

/// Filename reported for an upload that carried none.
pub const UNKNOWN_FILENAME: &str = "unknown";

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct BatchInput {
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
}

impl BatchInput {
    pub fn new(bytes: impl Into<Vec<u8>>, filename: Option<impl Into<String>>) -> Self {
        Self {
            bytes: bytes.into(),
            filename: filename.map(Into::into),
        }
    }

    fn usable_filename(&self) -> Option<&str> {
        self.filename.as_deref().filter(|f| !f.trim().is_empty())
    }
}

/// Extract every input in order.
///
/// Invariant: `result.total_files == inputs.len()`.
pub async fn run_batch(
    extractor: &Extractor,
    inputs: Vec<BatchInput>,
    options: &ExtractionOptions,
) -> BatchResult {
    info!("Batch extraction of {} files", inputs.len());
    let mut outcomes = Vec::with_capacity(inputs.len());

    for input in &inputs {
        let Some(filename) = input.usable_filename() else {
            let message = ExtractError::MissingFilename.to_string();
            error!("Batch file rejected: {}", message);
            outcomes.push(BatchFileOutcome::failure(UNKNOWN_FILENAME, message));
            continue;
        };

        match extractor.extract(&input.bytes, filename, options).await {
            Ok(result) => outcomes.push(BatchFileOutcome::success(filename, result)),
            Err(e) => {
                error!("Error processing {}: {}", filename, e);
                outcomes.push(BatchFileOutcome::failure(filename, e.to_string()));
            }
        }
    }

    let result = BatchResult::from_outcomes(outcomes);
    info!(
        "Batch finished: {} successful, {} failed",
        result.successful, result.failed
    );
    result
}
