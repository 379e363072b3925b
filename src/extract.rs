//! Extraction orchestrator: one uploaded document in, one canonical
//! [`ExtractionResult`] out.
//!
//! ## Steps
//!
//! ```text
//! validate ─▶ stage temp file ─▶ build config ─▶ fresh engine ─▶ convert
//!                                                                  │
//!      metadata ◀─ page-marker rewrite ◀─ export markdown ◀─ export tables
//! ```
//!
//! Every call gets its own temp file and its own engine instance. The temp
//! file is a [`tempfile::NamedTempFile`] and is removed when it drops, which
//! covers success, failure and a cancelled future alike.

use crate::config::ServiceSettings;
use crate::engine::{ConvertedDocument, EngineFactory, InputFormat, StandardEngineFactory};
use crate::error::ExtractError;
use crate::options::{ExtractionOptions, VlmMode};
use crate::output::{ExtractionResult, TableGrid, META_FILENAME, META_PAGE_COUNT};
use crate::pipeline::{rewrite_page_markers, PipelineBuilder, PAGE_BREAK_PLACEHOLDER};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Minimal single-page PDF converted by [`Extractor::warmup`].
pub const WARMUP_PDF: &[u8] = b"%PDF-1.4\n1 0 obj\n<<\n/Type /Catalog\n/Pages 2 0 R\n>>\nendobj\n2 0 obj\n<<\n/Type /Pages\n/Kids [3 0 R]\n/Count 1\n>>\nendobj\n3 0 obj\n<<\n/Type /Page\n/Parent 2 0 R\n/MediaBox [0 0 612 792]\n/Resources <<\n>>\n>>\nendobj\nxref\n0 4\n0000000000 65535 f\n0000000010 00000 n\n0000000060 00000 n\n0000000117 00000 n\ntrailer\n<<\n/Size 4\n/Root 1 0 R\n>>\nstartxref\n223\n%%EOF";

const WARMUP_FILENAME: &str = "warmup.pdf";

/// Runs extractions against an [`EngineFactory`].
///
/// Cheap to clone; share one per process.
#[derive(Clone)]
pub struct Extractor {
    settings: Arc<ServiceSettings>,
    factory: Arc<dyn EngineFactory>,
}

impl Extractor {
    /// Extractor backed by the bundled [`StandardEngineFactory`].
    pub fn new(settings: Arc<ServiceSettings>) -> Self {
        let factory = Arc::new(StandardEngineFactory::from_settings(&settings));
        Self { settings, factory }
    }

    /// Extractor backed by a custom engine.
    pub fn with_factory(settings: Arc<ServiceSettings>, factory: Arc<dyn EngineFactory>) -> Self {
        Self { settings, factory }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Extract an uploaded document.
    ///
    /// # Errors
    /// * [`ExtractError::MissingFilename`] / [`ExtractError::UnsupportedFormat`]
    ///   before anything touches the disk
    /// * [`ExtractError::Provider`] when API-mode VLM cannot be resolved
    /// * [`ExtractError::Conversion`] for any engine failure
    pub async fn extract(
        &self,
        bytes: &[u8],
        filename: &str,
        options: &ExtractionOptions,
    ) -> Result<ExtractionResult, ExtractError> {
        let (format, extension) = validate_filename(filename)?;

        let staged = tempfile::Builder::new()
            .prefix("docex-")
            .suffix(&format!(".{extension}"))
            .tempfile()
            .map_err(|source| ExtractError::TempFile {
                filename: filename.to_string(),
                source,
            })?;
        tokio::fs::write(staged.path(), bytes)
            .await
            .map_err(|source| ExtractError::TempFile {
                filename: filename.to_string(),
                source,
            })?;
        debug!(
            "Staged '{}' ({} bytes) at {}",
            filename,
            bytes.len(),
            staged.path().display()
        );

        let result = self.run(staged.path(), filename, format, options).await;
        drop(staged);
        result
    }

    /// Extract a document already on local disk. No temp copy is made.
    pub async fn extract_path(
        &self,
        path: &Path,
        options: &ExtractionOptions,
    ) -> Result<ExtractionResult, ExtractError> {
        if !path.is_file() {
            return Err(ExtractError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let (format, _) = validate_filename(&filename)?;
        self.run(path, &filename, format, options).await
    }

    /// Run one throwaway conversion with OCR, tables and the requested VLM
    /// forced on, so models and libraries are loaded before real traffic.
    pub async fn warmup(
        &self,
        vlm_mode: VlmMode,
        vlm_model_id: Option<String>,
    ) -> Result<(), ExtractError> {
        info!("Warming up extraction pipeline (vlm_mode={})", vlm_mode);
        let start = Instant::now();
        let options = ExtractionOptions::everything(vlm_mode, vlm_model_id);
        self.extract(WARMUP_PDF, WARMUP_FILENAME, &options).await?;
        info!("Warmup completed in {}ms", start.elapsed().as_millis());
        Ok(())
    }

    async fn run(
        &self,
        path: &Path,
        filename: &str,
        format: InputFormat,
        options: &ExtractionOptions,
    ) -> Result<ExtractionResult, ExtractError> {
        let start = Instant::now();
        info!("Starting extraction: {}", filename);

        let config = PipelineBuilder::new(&self.settings).build(options)?;
        let conversion_failed = |source| ExtractError::Conversion {
            filename: filename.to_string(),
            source,
        };

        let engine = self.factory.create(&config).map_err(conversion_failed)?;
        let document = engine
            .convert(path, format)
            .await
            .map_err(conversion_failed)?;

        let result = assemble(document.as_ref(), filename);
        info!(
            "Extraction complete: {} ({} pages, {} tables) in {}ms",
            filename,
            result.page_count(),
            result.tables.len(),
            start.elapsed().as_millis()
        );
        Ok(result)
    }
}

/// Check the filename and map its extension to an input format.
fn validate_filename(filename: &str) -> Result<(InputFormat, String), ExtractError> {
    if filename.trim().is_empty() {
        return Err(ExtractError::MissingFilename);
    }
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match InputFormat::from_filename(filename) {
        Some(format) => Ok((format, extension)),
        None => Err(ExtractError::UnsupportedFormat {
            filename: filename.to_string(),
            extension,
        }),
    }
}

fn assemble(document: &dyn ConvertedDocument, filename: &str) -> ExtractionResult {
    let tables = document
        .tables()
        .iter()
        .map(|t| TableGrid::from_grid(t.export_to_grid(), t.has_header))
        .collect();

    let markdown = rewrite_page_markers(&document.export_markdown(PAGE_BREAK_PLACEHOLDER));

    let mut metadata = Map::new();
    metadata.insert(META_FILENAME.to_string(), Value::from(filename));
    metadata.insert(
        META_PAGE_COUNT.to_string(),
        Value::from(document.page_count().resolve()),
    );

    ExtractionResult {
        markdown,
        tables,
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DetectedTable;
    use crate::error::EngineError;
    use crate::pipeline::VlmStatus;
    use crate::providers::ProviderError;
    use crate::testing::{StubFactory, FAILING_INPUT};
    use serde_json::json;

    fn extractor(stub: &StubFactory) -> Extractor {
        Extractor::with_factory(Arc::new(ServiceSettings::default()), Arc::new(stub.clone()))
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn blank_filename_is_rejected_before_conversion() {
        let stub = StubFactory::default();
        let err = extractor(&stub)
            .extract(b"x", "  ", &ExtractionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::MissingFilename));
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_extension_is_rejected() {
        let stub = StubFactory::default();
        let err = extractor(&stub)
            .extract(b"x", "archive.zip", &ExtractionOptions::default())
            .await
            .unwrap_err();
        assert!(
            matches!(err, ExtractError::UnsupportedFormat { ref extension, .. } if extension == "zip")
        );
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn assembles_markdown_tables_and_metadata() {
        let mut stub = StubFactory::with_pages(&["A", "B"]);
        stub.tables = vec![
            DetectedTable {
                cells: vec![row(&["k", "v"]), row(&["a", "1"])],
                has_header: true,
            },
            DetectedTable::default(),
            DetectedTable {
                cells: vec![row(&["x"])],
                has_header: false,
            },
        ];
        let result = extractor(&stub)
            .extract(b"%PDF-", "Report.PDF", &ExtractionOptions::default())
            .await
            .unwrap();

        assert_eq!(result.markdown, "## Page 1\n\nA\n\n---\n## Page 2\n\nB");
        assert_eq!(result.tables.len(), 3, "one grid per detected table");
        assert_eq!(result.tables[0].headers, Some(row(&["k", "v"])));
        assert_eq!(result.tables[0].rows, vec![row(&["a", "1"])]);
        assert_eq!(result.tables[1], TableGrid::default());
        assert_eq!(result.tables[2].headers, None);
        assert_eq!(result.tables[2].rows, vec![row(&["x"])]);
        assert_eq!(
            Value::Object(result.metadata.clone()),
            json!({"filename": "Report.PDF", "page_count": 2})
        );

        let calls = stub.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].format, InputFormat::Pdf);
        assert_eq!(calls[0].contents, b"%PDF-");
    }

    #[tokio::test]
    async fn temp_file_keeps_extension_and_is_removed() {
        let stub = StubFactory::default();
        extractor(&stub)
            .extract(b"hello", "notes.md", &ExtractionOptions::default())
            .await
            .unwrap();
        let staged = &stub.calls()[0].path;
        assert_eq!(staged.extension().and_then(|e| e.to_str()), Some("md"));
        assert!(!staged.exists(), "temp file must be deleted");
    }

    #[tokio::test]
    async fn temp_file_removed_on_engine_failure() {
        let stub = StubFactory::default();
        let err = extractor(&stub)
            .extract(FAILING_INPUT, "bad.pdf", &ExtractionOptions::default())
            .await
            .unwrap_err();
        match err {
            ExtractError::Conversion { filename, source } => {
                assert_eq!(filename, "bad.pdf");
                assert!(matches!(source, EngineError::CorruptDocument(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!stub.calls()[0].path.exists());
    }

    #[tokio::test]
    async fn lazy_non_numeric_page_count_becomes_zero() {
        let stub = StubFactory {
            page_count: json!("unknown"),
            lazy_page_count: true,
            ..Default::default()
        };
        let result = extractor(&stub)
            .extract(b"x", "a.txt", &ExtractionOptions::default())
            .await
            .unwrap();
        assert_eq!(result.metadata["page_count"], json!(0));
    }

    #[tokio::test]
    async fn lazy_page_count_is_resolved() {
        let stub = StubFactory {
            page_count: json!(4),
            lazy_page_count: true,
            ..Default::default()
        };
        let result = extractor(&stub)
            .extract(b"x", "a.txt", &ExtractionOptions::default())
            .await
            .unwrap();
        assert_eq!(result.page_count(), 4);
    }

    #[tokio::test]
    async fn options_flow_into_the_engine_configuration() {
        let stub = StubFactory::default();
        let options = ExtractionOptions {
            ocr_enabled: false,
            table_extraction_enabled: true,
            ..Default::default()
        };
        extractor(&stub).extract(b"x", "scan.png", &options).await.unwrap();
        let call = &stub.calls()[0];
        assert!(!call.config.do_ocr);
        assert!(call.config.do_table_structure);
        assert_eq!(call.format, InputFormat::Image);
    }

    #[tokio::test]
    async fn unresolvable_provider_fails_without_converting() {
        let stub = StubFactory::default();
        let settings = ServiceSettings::builder()
            .vlm_api_provider("custom")
            .vlm_api_key("k")
            .build()
            .unwrap();
        let ex = Extractor::with_factory(Arc::new(settings), Arc::new(stub.clone()));
        let options = ExtractionOptions {
            vlm_mode: VlmMode::Api,
            ..Default::default()
        };
        let err = ex.extract(b"x", "a.pdf", &options).await.unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Provider(ProviderError::BaseUrlRequired { .. })
        ));
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn warmup_forces_everything_on() {
        let stub = StubFactory::default();
        extractor(&stub).warmup(VlmMode::Local, None).await.unwrap();
        let call = &stub.calls()[0];
        assert_eq!(call.format, InputFormat::Pdf);
        assert_eq!(call.contents, WARMUP_PDF);
        assert!(call.config.do_ocr);
        assert!(call.config.do_table_structure);
        assert_eq!(call.config.vlm.status, VlmStatus::Enabled);
    }

    #[tokio::test]
    async fn extract_path_missing_file() {
        let stub = StubFactory::default();
        let err = extractor(&stub)
            .extract_path(Path::new("/definitely/not/here.pdf"), &ExtractionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn extract_path_reads_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "plain").unwrap();
        let stub = StubFactory::default();
        let result = extractor(&stub)
            .extract_path(&path, &ExtractionOptions::default())
            .await
            .unwrap();
        assert_eq!(result.filename(), Some("doc.txt"));
        assert_eq!(stub.calls()[0].path, path);
        assert!(path.exists());
    }
}
