//! Route handlers.
//!
//! Every extraction route parses the same multipart form, runs one
//! [`Extractor`](crate::extract::Extractor) call and differs only in how the
//! result is rendered.

use super::error::ApiError;
use super::form::ExtractForm;
use super::state::AppState;
use crate::batch::{run_batch, BatchInput};
use crate::format::{render_json, JsonDocument, OutputFormat};
use crate::options::ExtractionOptions;
use crate::output::{BatchResult, ExtractionResult};
use crate::persist::save_markdown;
use axum::{
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

/// `/extract-and-save` response body.
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub message: &'static str,
    pub saved_path: String,
    pub extraction: ExtractionResult,
}

/// `/warmup` and other message-only response bodies.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

async fn extract_single(
    state: &AppState,
    multipart: Multipart,
    route: &str,
) -> Result<(String, ExtractionResult), ApiError> {
    let (file, options) = ExtractForm::from_multipart(multipart).await?.single_file()?;
    let filename = file.require_filename()?.to_string();
    log_request(route, Some(&filename), &options);
    let result = state
        .extractor
        .extract(&file.bytes, &filename, &options)
        .await?;
    Ok((filename, result))
}

fn rendered(result: &ExtractionResult, format: OutputFormat) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, format.content_type())],
        format.render(result),
    )
}

fn log_request(route: &str, filename: Option<&str>, options: &ExtractionOptions) {
    info!(
        "Received {} request for {} - vlm_mode: {}, vlm_model_id: {:?}, ocr: {}, tables: {}",
        route,
        filename.unwrap_or("-"),
        options.vlm_mode,
        options.vlm_model_id,
        options.ocr_enabled,
        options.table_extraction_enabled
    );
}

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

pub async fn extract(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractionResult>, ApiError> {
    let (_, result) = extract_single(&state, multipart, "extract").await?;
    Ok(Json(result))
}

pub async fn extract_and_save(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SaveResponse>, ApiError> {
    let (filename, result) = extract_single(&state, multipart, "extract-and-save").await?;
    let saved = save_markdown(&state.settings.storage_dir, &result.markdown, &filename).await?;
    Ok(Json(SaveResponse {
        message: "Extraction successful and file saved.",
        saved_path: saved.display().to_string(),
        extraction: result,
    }))
}

pub async fn warmup(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<MessageResponse>, ApiError> {
    let form = ExtractForm::from_multipart(multipart).await?;
    log_request("warmup", None, &form.options);
    state
        .extractor
        .warmup(form.options.vlm_mode, form.options.vlm_model_id)
        .await?;
    Ok(Json(MessageResponse {
        message: "Warmup completed successfully",
    }))
}

pub async fn batch_extract(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<BatchResult>, ApiError> {
    let form = ExtractForm::from_multipart(multipart).await?;
    if form.files.is_empty() {
        return Err(ApiError::bad_request("Field 'files' is required"));
    }
    info!(
        "Received batch extract request for {} files - vlm_mode: {}, ocr: {}, tables: {}",
        form.files.len(),
        form.options.vlm_mode,
        form.options.ocr_enabled,
        form.options.table_extraction_enabled
    );
    let inputs: Vec<BatchInput> = form.files.into_iter().map(BatchInput::from).collect();
    Ok(Json(run_batch(&state.extractor, inputs, &form.options).await))
}

pub async fn extract_json(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<JsonDocument>, ApiError> {
    let (_, result) = extract_single(&state, multipart, "extract-json").await?;
    Ok(Json(render_json(&result)))
}

pub async fn extract_html(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let (_, result) = extract_single(&state, multipart, "extract-html").await?;
    Ok(rendered(&result, OutputFormat::Html))
}

pub async fn extract_text(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let (_, result) = extract_single(&state, multipart, "extract-text").await?;
    Ok(rendered(&result, OutputFormat::Text))
}
