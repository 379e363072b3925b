//! # docex-serve
//!
//! Document extraction service: upload a PDF, image, Markdown or text file
//! and get back Markdown with page headers, detected tables and metadata,
//! optionally with embedded pictures described by a vision-language model.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (bytes + filename + options)
//!  │
//!  ├─ 1. Validate  filename present, extension supported
//!  ├─ 2. Stage     temp file with the original extension (deleted on drop)
//!  ├─ 3. Build     PipelineConfiguration: OCR, tables, VLM resolution
//!  ├─ 4. Convert   fresh engine per request (pdfium / tesseract / VLM)
//!  ├─ 5. Export    tables → grids, markdown with page-break placeholders
//!  ├─ 6. Rewrite   placeholders → "## Page N"
//!  └─ 7. Render    markdown / JSON / HTML / plain text
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docex_serve::{ExtractionOptions, Extractor, ServiceSettings};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Arc::new(ServiceSettings::load()?);
//!     let extractor = Extractor::new(settings);
//!     let bytes = std::fs::read("document.pdf")?;
//!     let result = extractor
//!         .extract(&bytes, "document.pdf", &ExtractionOptions::default())
//!         .await?;
//!     println!("{}", result.markdown);
//!     eprintln!("{} pages, {} tables", result.page_count(), result.tables.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | HTTP router and the `docex-server` binary (axum, tower-http, clap, anyhow, dotenvy, tracing-subscriber) |
//!
//! Disable `server` to embed only the extraction library:
//! ```toml
//! docex-serve = { version = "1", default-features = false }
//! ```
//!
//! ## VLM Modes
//!
//! | Mode    | Endpoint                          | Model default |
//! |---------|-----------------------------------|---------------|
//! | `none`  | none                              | none          |
//! | `local` | `VLM_LOCAL_URL`                   | `HuggingFaceTB/SmolVLM-256M-Instruct` |
//! | `api`   | provider registry / `VLM_API_BASE_URL` | per provider |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod format;
pub mod options;
pub mod output;
pub mod persist;
pub mod pipeline;
pub mod prompts;
pub mod providers;

#[cfg(feature = "server")]
pub mod logging;
#[cfg(feature = "server")]
pub mod server;

#[cfg(test)]
mod testing;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{run_batch, BatchInput};
pub use config::{ServiceSettings, ServiceSettingsBuilder};
pub use engine::{EngineFactory, InputFormat, StandardEngineFactory};
pub use error::{EngineError, ExtractError};
pub use extract::Extractor;
pub use format::{render_html, render_json, render_markdown, render_text, OutputFormat};
pub use options::{ExtractionOptions, VlmMode};
pub use output::{BatchFileOutcome, BatchResult, ExtractionResult, FileStatus, TableGrid};
pub use persist::save_markdown;
pub use providers::ProviderError;
