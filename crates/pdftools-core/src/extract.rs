//! Page extraction
//!
//! Builds a new document from a subset of a source document's pages, in
//! caller-supplied order. Backs the split operation, where each range
//! token becomes one extracted document.

use crate::error::PdfToolsError;
use crate::tree::{pages_node_id, set_page_kids};
use lopdf::{Document, Object, ObjectId};
use std::collections::HashSet;

/// Extract `pages` (1-based, in desired output order, duplicates allowed)
/// into a standalone document.
pub fn extract_pages(bytes: &[u8], pages: &[u32]) -> Result<Vec<u8>, PdfToolsError> {
    if pages.is_empty() {
        return Err(PdfToolsError::InvalidRange("No pages selected".into()));
    }

    let doc = Document::load_mem(bytes).map_err(|e| PdfToolsError::Parse(e.to_string()))?;
    let page_map = doc.get_pages();
    let page_count = page_map.len() as u32;

    for &page in pages {
        if page < 1 || page > page_count {
            return Err(PdfToolsError::InvalidRange(format!(
                "Page {} does not exist (document has {} pages)",
                page, page_count
            )));
        }
    }

    let mut new_doc = doc.clone();
    let pages_id = pages_node_id(&new_doc)?;

    // Rebuild the page list in the requested order. A page requested more
    // than once gets a fresh object id for each repeat so the Kids array
    // never references the same page object twice.
    let mut seen: HashSet<ObjectId> = HashSet::new();
    let mut refs = Vec::with_capacity(pages.len());
    for page in pages {
        let id = page_map[page];
        if seen.insert(id) {
            refs.push(id);
        } else {
            refs.push(duplicate_page(&mut new_doc, id, pages_id)?);
        }
    }

    set_page_kids(&mut new_doc, refs)?;

    // Unselected pages are now unreachable from the catalog; drop them
    // and anything only they referenced.
    new_doc.prune_objects();
    new_doc.compress();

    let mut buffer = Vec::new();
    new_doc
        .save_to(&mut buffer)
        .map_err(|e| PdfToolsError::Operation(format!("Failed to save extracted PDF: {}", e)))?;

    Ok(buffer)
}

/// Shallow-copy a page dictionary under a new object id. Content and
/// resource references stay shared with the original page.
fn duplicate_page(
    doc: &mut Document,
    page_id: ObjectId,
    parent_id: ObjectId,
) -> Result<ObjectId, PdfToolsError> {
    let mut dict = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|_| PdfToolsError::Operation("Page is not a dictionary".into()))?
        .clone();
    dict.set("Parent", Object::Reference(parent_id));
    Ok(doc.add_object(Object::Dictionary(dict)))
}
