//! PDF document operations
//!
//! In-memory PDF manipulation for the gateway server, built on lopdf:
//!
//! - [`merge_documents`]: concatenate documents in upload order
//! - [`extract_pages`]: build a new document from selected pages
//! - [`rotate_pages`]: add a rotation delta to every page
//! - [`images_to_pdf`]: one page per uploaded JPEG/PNG
//! - [`ranges::parse_ranges`]: page range specifications like `"1-3, 5"`
//!
//! Everything here takes and returns plain byte buffers; no I/O, no HTTP.

pub mod error;
pub mod extract;
pub mod images;
pub mod merge;
pub mod ranges;
pub mod rotate;
mod tree;

#[cfg(test)]
mod test_pdf;

pub use error::PdfToolsError;
pub use extract::extract_pages;
pub use images::{images_to_pdf, ImageFormat, PageImage};
pub use merge::merge_documents;
pub use ranges::{parse_ranges, RangeReport, SkipReason, TokenOutcome};
pub use rotate::rotate_pages;

/// Parse PDF bytes and return the page count.
pub fn get_page_count(bytes: &[u8]) -> Result<u32, PdfToolsError> {
    let doc =
        lopdf::Document::load_mem(bytes).map_err(|e| PdfToolsError::Parse(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_pdf::create_test_pdf;

    #[test]
    fn page_count_of_valid_document() {
        let pdf = create_test_pdf(4, "Doc");
        assert_eq!(get_page_count(&pdf).unwrap(), 4);
    }

    #[test]
    fn page_count_of_garbage_fails() {
        assert!(get_page_count(b"garbage").is_err());
    }
}
