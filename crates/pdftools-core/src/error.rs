use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfToolsError {
    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("Invalid page range: {0}")]
    InvalidRange(String),

    #[error("Unsupported image data: {0}")]
    UnsupportedImage(String),

    #[error("PDF operation failed: {0}")]
    Operation(String),
}
