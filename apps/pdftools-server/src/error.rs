//! Error types for the gateway server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pdftools_core::PdfToolsError;
use serde_json::json;
use thiserror::Error;

use crate::ghostscript::RasterError;

/// Server error taxonomy.
///
/// `Validation` maps to 400 and is raised before any resource is
/// allocated; everything else maps to 500. Engine diagnostics are logged
/// but never echoed to the caller.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Pdf(#[from] PdfToolsError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error("Scratch file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive assembly failed: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::Pdf(e) => {
                tracing::error!("PDF processing failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to process the uploaded document".to_string(),
                )
            }
            ServerError::Raster(e) => {
                e.log();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Document conversion failed".to_string(),
                )
            }
            ServerError::Io(e) => {
                tracing::error!("Scratch file I/O failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
            ServerError::Archive(e) => {
                tracing::error!("Archive assembly failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to build result archive".to_string(),
                )
            }
            ServerError::Task(e) => {
                tracing::error!("Worker task failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
