//! Request dispatch for the six document operations
//!
//! Each handler validates the multipart payload before allocating any
//! resource, runs the in-memory document work on the blocking pool, and
//! streams back either one document or a zip archive. Engine-backed
//! handlers release their scratch scope on every exit path.

use std::collections::HashMap;

use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde::Serialize;
use tokio::task;
use tracing::{info, warn};

use pdftools_core::{
    extract_pages, get_page_count, images_to_pdf, merge_documents, parse_ranges, rotate_pages,
    ImageFormat, PageImage,
};

use crate::archive::ArchiveBuilder;
use crate::error::ServerError;
use crate::scratch::RequestScratch;
use crate::AppState;

/// One uploaded file from the multipart payload.
pub struct UploadedFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Fully-read multipart payload: uploads plus text fields.
struct FormPayload {
    files: Vec<UploadedFile>,
    fields: HashMap<String, String>,
}

async fn read_form(mut multipart: Multipart) -> Result<FormPayload, ServerError> {
    let mut files = Vec::new();
    let mut fields = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::Validation(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(file_name) = field.file_name() {
            let file_name = file_name.to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::Validation(format!("Failed to read upload: {}", e)))?;
            files.push(UploadedFile {
                name: file_name,
                content_type,
                bytes,
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ServerError::Validation(format!("Failed to read field: {}", e)))?;
            fields.insert(name, value);
        }
    }

    Ok(FormPayload { files, fields })
}

fn single_file(form: &FormPayload) -> Result<&UploadedFile, ServerError> {
    form.files
        .first()
        .ok_or_else(|| ServerError::Validation("Upload 1 PDF file".into()))
}

fn binary_attachment(content_type: &'static str, filename: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response()
}

fn pdf_attachment(filename: &str, bytes: Vec<u8>) -> Response {
    binary_attachment("application/pdf", filename, bytes)
}

fn zip_attachment(filename: &str, bytes: Vec<u8>) -> Response {
    binary_attachment("application/zip", filename, bytes)
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "pdftools-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Handler: POST /merge
pub async fn handle_merge(multipart: Multipart) -> Result<Response, ServerError> {
    let form = read_form(multipart).await?;
    if form.files.len() < 2 {
        return Err(ServerError::Validation(
            "Upload at least 2 PDF files".into(),
        ));
    }
    info!(files = form.files.len(), "merge request");

    let documents: Vec<Vec<u8>> = form.files.iter().map(|f| f.bytes.to_vec()).collect();
    let merged = task::spawn_blocking(move || merge_documents(documents)).await??;

    Ok(pdf_attachment("merged.pdf", merged))
}

/// Handler: POST /split
pub async fn handle_split(multipart: Multipart) -> Result<Response, ServerError> {
    let form = read_form(multipart).await?;
    let file = single_file(&form)?;
    let spec = form
        .fields
        .get("ranges")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ServerError::Validation("Provide a page range specification".into()))?
        .to_string();
    info!(ranges = %spec, "split request");

    let bytes = file.bytes.to_vec();
    let archive = task::spawn_blocking(move || -> Result<Vec<u8>, ServerError> {
        let page_count = get_page_count(&bytes)?;
        let report = parse_ranges(&spec, page_count);

        for (token, reason) in report.skipped() {
            warn!(token, %reason, "skipping invalid range token");
        }
        if report.is_empty_selection() {
            // Deliberately permissive: an all-invalid specification still
            // yields a valid, empty archive.
            warn!(ranges = %spec, "no valid range tokens in specification");
        }

        let mut builder = ArchiveBuilder::new();
        for (token, pages) in report.selections() {
            let part = extract_pages(&bytes, pages)?;
            builder.append(&format!("pages_{}.pdf", token), &part)?;
        }
        Ok(builder.finish()?)
    })
    .await??;

    Ok(zip_attachment("split.zip", archive))
}

/// Handler: POST /compress
pub async fn handle_compress(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ServerError> {
    let form = read_form(multipart).await?;
    let file = single_file(&form)?;
    info!(file = %file.name, size = file.bytes.len(), "compress request");

    let mut scratch = RequestScratch::new(&state.scratch);
    let result = state.rasterizer.compress(&mut scratch, &file.bytes).await;
    scratch.release().await;

    Ok(pdf_attachment("compressed.pdf", result?))
}

/// Handler: POST /convert-to-document
pub async fn handle_convert_to_document(multipart: Multipart) -> Result<Response, ServerError> {
    let form = read_form(multipart).await?;
    if form.files.is_empty() {
        return Err(ServerError::Validation(
            "Upload at least 1 image file".into(),
        ));
    }

    let mut images = Vec::new();
    for file in &form.files {
        let format = match file.content_type.as_str() {
            "image/jpeg" => ImageFormat::Jpeg,
            "image/png" => ImageFormat::Png,
            other => {
                warn!(file = %file.name, content_type = %other, "skipping unsupported image type");
                continue;
            }
        };
        images.push(PageImage {
            format,
            bytes: file.bytes.to_vec(),
        });
    }
    if images.is_empty() {
        return Err(ServerError::Validation(
            "No JPG or PNG images found in upload".into(),
        ));
    }
    info!(images = images.len(), "image conversion request");

    let pdf = task::spawn_blocking(move || images_to_pdf(&images)).await??;

    Ok(pdf_attachment("converted.pdf", pdf))
}

/// Handler: POST /convert-from-document
pub async fn handle_convert_from_document(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ServerError> {
    let form = read_form(multipart).await?;
    let file = single_file(&form)?;
    info!(file = %file.name, size = file.bytes.len(), "rasterize request");

    let mut scratch = RequestScratch::new(&state.scratch);
    let result = rasterize_to_archive(&state, &mut scratch, &file.bytes).await;
    scratch.release().await;

    Ok(zip_attachment("pages.zip", result?))
}

async fn rasterize_to_archive(
    state: &AppState,
    scratch: &mut RequestScratch,
    input: &[u8],
) -> Result<Vec<u8>, ServerError> {
    let pages = state.rasterizer.rasterize(scratch, input).await?;

    let mut builder = ArchiveBuilder::new();
    for (index, path) in pages.iter().enumerate() {
        let data = scratch.read(path).await?;
        builder.append(&format!("page_{}.jpg", index + 1), &data)?;
    }
    Ok(builder.finish()?)
}

/// Handler: POST /rotate
pub async fn handle_rotate(multipart: Multipart) -> Result<Response, ServerError> {
    let form = read_form(multipart).await?;
    let file = single_file(&form)?;
    let angle = form
        .fields
        .get("angle")
        .and_then(|a| a.trim().parse::<u16>().ok())
        .filter(|a| matches!(a, 90 | 180 | 270))
        .ok_or_else(|| ServerError::Validation("Rotation angle must be 90, 180 or 270".into()))?;
    info!(angle, "rotate request");

    let bytes = file.bytes.to_vec();
    let rotated = task::spawn_blocking(move || rotate_pages(&bytes, angle)).await??;

    Ok(pdf_attachment("rotated.pdf", rotated))
}
