//! In-crate test doubles for the engine boundary.

use crate::engine::{
    ConversionEngine, ConvertedDocument, DetectedTable, EngineFactory, InputFormat, RawPageCount,
};
use crate::error::EngineError;
use crate::pipeline::PipelineConfiguration;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Input content that makes the stub engine fail.
pub(crate) const FAILING_INPUT: &[u8] = b"%CORRUPT%";

/// One `convert` call as seen by the stub.
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub config: PipelineConfiguration,
    pub format: InputFormat,
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

#[derive(Clone)]
pub(crate) struct StubFactory {
    pub pages: Vec<String>,
    pub tables: Vec<DetectedTable>,
    /// Reported through a zero-argument accessor when `lazy_page_count`.
    pub page_count: Value,
    pub lazy_page_count: bool,
    pub calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl Default for StubFactory {
    fn default() -> Self {
        Self {
            pages: vec!["stub content".to_string()],
            tables: Vec::new(),
            page_count: Value::from(1),
            lazy_page_count: false,
            calls: Arc::default(),
        }
    }
}

impl StubFactory {
    pub fn with_pages(pages: &[&str]) -> Self {
        Self {
            pages: pages.iter().map(|p| p.to_string()).collect(),
            page_count: Value::from(pages.len()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl EngineFactory for StubFactory {
    fn create(&self, config: &PipelineConfiguration) -> Result<Box<dyn ConversionEngine>, EngineError> {
        Ok(Box::new(StubEngine {
            factory: self.clone(),
            config: config.clone(),
        }))
    }
}

struct StubEngine {
    factory: StubFactory,
    config: PipelineConfiguration,
}

#[async_trait]
impl ConversionEngine for StubEngine {
    async fn convert(
        &self,
        path: &Path,
        format: InputFormat,
    ) -> Result<Box<dyn ConvertedDocument>, EngineError> {
        let contents = std::fs::read(path)?;
        self.factory.calls.lock().unwrap().push(RecordedCall {
            config: self.config.clone(),
            format,
            path: path.to_path_buf(),
            contents: contents.clone(),
        });
        if contents == FAILING_INPUT {
            return Err(EngineError::CorruptDocument("stub rejected input".into()));
        }
        Ok(Box::new(StubDocument {
            pages: self.factory.pages.clone(),
            tables: self.factory.tables.clone(),
            page_count: self.factory.page_count.clone(),
            lazy_page_count: self.factory.lazy_page_count,
        }))
    }
}

struct StubDocument {
    pages: Vec<String>,
    tables: Vec<DetectedTable>,
    page_count: Value,
    lazy_page_count: bool,
}

impl ConvertedDocument for StubDocument {
    fn tables(&self) -> &[DetectedTable] {
        &self.tables
    }

    fn export_markdown(&self, page_break_placeholder: &str) -> String {
        self.pages.join(page_break_placeholder)
    }

    fn page_count(&self) -> RawPageCount {
        if self.lazy_page_count {
            let value = self.page_count.clone();
            RawPageCount::Accessor(Box::new(move || value))
        } else {
            RawPageCount::Value(self.page_count.clone())
        }
    }
}
