//! The bundled conversion engine.
//!
//! | Input            | Text source                          | Tables              |
//! |------------------|--------------------------------------|---------------------|
//! | PDF              | pdfium text layer, OCR when empty    | pipe + columnar     |
//! | PNG / JPEG       | OCR                                  | pipe + columnar     |
//! | Markdown / text  | file contents (UTF-8)                | pipe                |
//!
//! Picture description runs for embedded PDF images and for image inputs
//! whenever the configuration carries [`PictureDescriptionOptions`].

use super::describe::PictureDescriber;
use super::document::{Block, EngineDocument, Page};
use super::ocr::{TesseractOcr, TESSERACT_PROGRAM};
use super::pdf::{scan_pdf, ScanRequest};
use super::{tables, ConversionEngine, ConvertedDocument, EngineFactory, InputFormat};
use crate::config::ServiceSettings;
use crate::error::EngineError;
use crate::pipeline::{PictureDescriptionKind, PictureDescriptionOptions, PipelineConfiguration};
use async_trait::async_trait;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Builds a [`StandardEngine`] per pipeline configuration.
#[derive(Debug, Clone)]
pub struct StandardEngineFactory {
    pdfium_lib_path: Option<PathBuf>,
    ocr_program: String,
    ocr_language: String,
    description_timeout: Duration,
}

impl StandardEngineFactory {
    pub fn from_settings(settings: &ServiceSettings) -> Self {
        Self {
            pdfium_lib_path: settings.pdfium_lib_path.clone(),
            ocr_program: TESSERACT_PROGRAM.to_string(),
            ocr_language: settings.ocr_language.clone(),
            description_timeout: Duration::from_secs(settings.vlm_api_timeout_secs),
        }
    }

    /// Run OCR with `program` instead of `tesseract` from `PATH`.
    pub fn with_ocr_program(mut self, program: impl Into<String>) -> Self {
        self.ocr_program = program.into();
        self
    }
}

impl Default for StandardEngineFactory {
    fn default() -> Self {
        Self::from_settings(&ServiceSettings::default())
    }
}

impl EngineFactory for StandardEngineFactory {
    fn create(&self, config: &PipelineConfiguration) -> Result<Box<dyn ConversionEngine>, EngineError> {
        let describer = match &config.picture_description {
            Some(PictureDescriptionOptions {
                kind: PictureDescriptionKind::Api { .. },
                ..
            }) if !config.enable_remote_services => {
                return Err(EngineError::RemoteServicesDisabled);
            }
            Some(options) => Some(PictureDescriber::new(
                options.clone(),
                self.description_timeout,
            )?),
            None => None,
        };

        Ok(Box::new(StandardEngine {
            config: config.clone(),
            ocr: TesseractOcr::with_program(self.ocr_program.clone(), self.ocr_language.clone()),
            describer,
            pdfium_lib_path: self.pdfium_lib_path.clone(),
        }))
    }
}

/// Engine bound to one [`PipelineConfiguration`].
pub struct StandardEngine {
    config: PipelineConfiguration,
    ocr: TesseractOcr,
    describer: Option<PictureDescriber>,
    pdfium_lib_path: Option<PathBuf>,
}

impl StandardEngine {
    fn text_blocks(&self, text: &str, columnar: bool) -> Vec<Block> {
        if self.config.do_table_structure {
            tables::split_blocks(text, self.config.table_mode, columnar)
        } else if text.trim().is_empty() {
            Vec::new()
        } else {
            vec![Block::Text(text.to_string())]
        }
    }

    async fn picture_block(&self, image: &DynamicImage, area_fraction: f32) -> Block {
        let description = match &self.describer {
            Some(describer) if describer.qualifies(area_fraction) => {
                describer.describe_soft(image).await
            }
            _ => None,
        };
        Block::Picture { description }
    }

    async fn convert_pdf(&self, path: &Path) -> Result<EngineDocument, EngineError> {
        let request = ScanRequest {
            rasterise_textless: self.config.do_ocr,
            extract_pictures: self.describer.is_some(),
        };
        let scanned = scan_pdf(path, self.pdfium_lib_path.clone(), request).await?;

        let mut pages = Vec::with_capacity(scanned.len());
        for page in scanned {
            let text = match &page.raster {
                Some(raster) => {
                    debug!("Page {} has no text layer, running OCR", page.index + 1);
                    self.ocr.recognize_soft(raster).await
                }
                None => page.text,
            };
            let mut blocks = self.text_blocks(&text, true);
            for picture in &page.pictures {
                blocks.push(self.picture_block(&picture.image, picture.area_fraction).await);
            }
            pages.push(Page::new(blocks));
        }
        Ok(EngineDocument::new(pages))
    }

    async fn convert_image(&self, path: &Path) -> Result<EngineDocument, EngineError> {
        let owned = path.to_path_buf();
        let image = tokio::task::spawn_blocking(move || image::open(owned))
            .await
            .map_err(|e| EngineError::Internal(format!("Image decode task panicked: {}", e)))??;

        let text = if self.config.do_ocr {
            self.ocr.recognize_soft(&image).await
        } else {
            String::new()
        };
        let mut blocks = self.text_blocks(&text, true);
        blocks.push(self.picture_block(&image, 1.0).await);
        Ok(EngineDocument::new(vec![Page::new(blocks)]))
    }

    async fn convert_text(&self, path: &Path) -> Result<EngineDocument, EngineError> {
        let text = tokio::fs::read_to_string(path).await?;
        Ok(EngineDocument::new(vec![Page::new(
            self.text_blocks(&text, false),
        )]))
    }
}

#[async_trait]
impl ConversionEngine for StandardEngine {
    async fn convert(
        &self,
        path: &Path,
        format: InputFormat,
    ) -> Result<Box<dyn ConvertedDocument>, EngineError> {
        info!(
            "Converting {} as {:?} (ocr={}, tables={}, pictures={})",
            path.display(),
            format,
            self.config.do_ocr,
            self.config.do_table_structure,
            self.describer.is_some()
        );
        let document = match format {
            InputFormat::Pdf => self.convert_pdf(path).await?,
            InputFormat::Image => self.convert_image(path).await?,
            InputFormat::Markdown | InputFormat::Text => self.convert_text(path).await?,
        };
        Ok(Box::new(document))
    }
}
