//! Tesseract OCR via the command line.
//!
//! The image is written as a PNG into a scratch directory and handed to
//! `tesseract <png> stdout -l <lang>`. A missing binary is not fatal for a
//! conversion: [`TesseractOcr::recognize_soft`] logs one warning per engine
//! and yields no text.

use super::encode::encode_png;
use crate::error::EngineError;
use image::DynamicImage;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, warn};

/// Default OCR executable, resolved through `PATH`.
pub const TESSERACT_PROGRAM: &str = "tesseract";

pub struct TesseractOcr {
    program: String,
    language: String,
    warned_unavailable: AtomicBool,
}

impl TesseractOcr {
    /// `program` is a tesseract executable name or path.
    pub fn with_program(program: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            language: language.into(),
            warned_unavailable: AtomicBool::new(false),
        }
    }

    /// Run tesseract on an image file.
    pub async fn recognize_file(&self, image_path: &Path) -> Result<String, EngineError> {
        let output = Command::new(&self.program)
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(EngineError::OcrFailed(format!("tesseract failed: {}", stderr.trim())))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(EngineError::OcrUnavailable(
                format!("{} not found (install tesseract-ocr)", self.program),
            )),
            Err(e) => Err(EngineError::Io(e)),
        }
    }

    /// Run tesseract on an in-memory image.
    pub async fn recognize(&self, img: &DynamicImage) -> Result<String, EngineError> {
        let scratch = TempDir::new()?;
        let path = scratch.path().join("page.png");
        tokio::fs::write(&path, encode_png(img)?).await?;
        debug!("OCR input staged at {}", path.display());
        self.recognize_file(&path).await
    }

    /// Like [`Self::recognize`], but degrades to an empty string on failure.
    pub async fn recognize_soft(&self, img: &DynamicImage) -> String {
        match self.recognize(img).await {
            Ok(text) => text,
            Err(EngineError::OcrUnavailable(msg)) => {
                if !self.warned_unavailable.swap(true, Ordering::Relaxed) {
                    warn!("{msg}; continuing without OCR text");
                }
                String::new()
            }
            Err(e) => {
                warn!("OCR failed, continuing without OCR text: {e}");
                String::new()
            }
        }
    }

    #[cfg(test)]
    fn warned(&self) -> bool {
        self.warned_unavailable.load(Ordering::Relaxed)
    }
}
