//! PDF scanning via pdfium: text layer, rasterised pages and embedded
//! pictures.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and is not safe to drive from async tasks. All pdfium work runs in
//! one `spawn_blocking` call that returns owned images; OCR and picture
//! description happen afterwards on the async side.
//!
//! ## Library binding
//!
//! Tried in order: the configured `pdfium_lib_path` (a file or a directory),
//! the platform library next to the working directory, the system library.

use crate::error::EngineError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Longest edge, in pixels, of a page rasterised for OCR.
pub const MAX_RENDERED_PIXELS: u32 = 2000;

/// What to pull out of each page besides the text layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanRequest {
    /// Rasterise pages whose text layer is empty.
    pub rasterise_textless: bool,
    /// Extract embedded image objects.
    pub extract_pictures: bool,
}

/// An embedded picture and the fraction of its page it covers.
pub struct ScannedPicture {
    pub image: DynamicImage,
    pub area_fraction: f32,
}

/// Raw material for one page.
pub struct ScannedPage {
    pub index: usize,
    pub text: String,
    /// Present when the page had no text layer and rasterisation was asked for.
    pub raster: Option<DynamicImage>,
    pub pictures: Vec<ScannedPicture>,
}

/// Scan every page of a PDF.
pub async fn scan_pdf(
    pdf_path: &Path,
    lib_path: Option<PathBuf>,
    request: ScanRequest,
) -> Result<Vec<ScannedPage>, EngineError> {
    let path = pdf_path.to_path_buf();
    tokio::task::spawn_blocking(move || scan_pdf_blocking(&path, lib_path.as_deref(), request))
        .await
        .map_err(|e| EngineError::Internal(format!("PDF scan task panicked: {}", e)))?
}

/// Bind to a pdfium library.
pub fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, EngineError> {
    if let Some(configured) = lib_path {
        let candidate = if configured.is_dir() {
            Pdfium::pdfium_platform_library_name_at_path(configured)
        } else {
            configured.to_path_buf()
        };
        return Pdfium::bind_to_library(&candidate)
            .map(Pdfium::new)
            .map_err(|e| EngineError::PdfiumBinding(format!("{}: {:?}", candidate.display(), e)));
    }

    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| EngineError::PdfiumBinding(format!("{:?}", e)))
}

fn scan_pdf_blocking(
    pdf_path: &Path,
    lib_path: Option<&Path>,
    request: ScanRequest,
) -> Result<Vec<ScannedPage>, EngineError> {
    let pdfium = bind_pdfium(lib_path)?;

    let document = pdfium.load_pdf_from_file(pdf_path, None).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            EngineError::PasswordRequired
        } else {
            EngineError::CorruptDocument(err_str)
        }
    })?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let render_config = PdfRenderConfig::new()
        .set_target_width(MAX_RENDERED_PIXELS as i32)
        .set_maximum_height(MAX_RENDERED_PIXELS as i32);

    let mut scanned = Vec::with_capacity(pages.len() as usize);
    for (index, page) in pages.iter().enumerate() {
        let text = match page.text() {
            Ok(t) => t.all(),
            Err(e) => {
                warn!("Page {}: no readable text layer ({:?})", index + 1, e);
                String::new()
            }
        };

        let raster = if request.rasterise_textless && text.trim().is_empty() {
            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                EngineError::RasterisationFailed {
                    page: index + 1,
                    detail: format!("{:?}", e),
                }
            })?;
            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px for OCR",
                index + 1,
                image.width(),
                image.height()
            );
            Some(image)
        } else {
            None
        };

        let pictures = if request.extract_pictures {
            page_pictures(&page, index)
        } else {
            Vec::new()
        };

        scanned.push(ScannedPage {
            index,
            text,
            raster,
            pictures,
        });
    }

    Ok(scanned)
}

fn page_pictures(page: &PdfPage, index: usize) -> Vec<ScannedPicture> {
    let page_area = page.width().value * page.height().value;
    let mut pictures = Vec::new();

    for object in page.objects().iter() {
        let Some(image_object) = object.as_image_object() else {
            continue;
        };
        let image = match image_object.get_raw_image() {
            Ok(image) => image,
            Err(e) => {
                warn!("Page {}: skipping unreadable picture ({:?})", index + 1, e);
                continue;
            }
        };
        let area = match (object.width(), object.height()) {
            (Ok(w), Ok(h)) => w.value * h.value,
            _ => 0.0,
        };
        let area_fraction = if page_area > 0.0 {
            (area / page_area).clamp(0.0, 1.0)
        } else {
            0.0
        };
        pictures.push(ScannedPicture {
            image,
            area_fraction,
        });
    }

    if !pictures.is_empty() {
        debug!("Page {}: {} embedded pictures", index + 1, pictures.len());
    }
    pictures
}
