//! Whole-document page rotation.

use crate::error::PdfToolsError;
use crate::tree::ordered_page_refs;
use lopdf::{Document, Object, ObjectId};

/// Add `delta` degrees to every page's rotation, modulo 360.
///
/// The current rotation is read through page-tree inheritance (a page
/// without its own `/Rotate` inherits from its ancestors, defaulting
/// to 0); the new value is always written on the page itself.
pub fn rotate_pages(bytes: &[u8], delta: u16) -> Result<Vec<u8>, PdfToolsError> {
    let mut doc = Document::load_mem(bytes).map_err(|e| PdfToolsError::Parse(e.to_string()))?;

    for page_id in ordered_page_refs(&doc) {
        let current = current_rotation(&doc, page_id);
        let rotation = (current + i64::from(delta)).rem_euclid(360);

        let dict = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|_| PdfToolsError::Operation("Page is not a dictionary".into()))?;
        dict.set("Rotate", Object::Integer(rotation));
    }

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfToolsError::Operation(format!("Failed to save rotated PDF: {}", e)))?;

    Ok(buffer)
}

/// Effective `/Rotate` of a page, normalized to `[0, 360)`.
fn current_rotation(doc: &Document, page_id: ObjectId) -> i64 {
    let mut id = page_id;
    loop {
        let Ok(dict) = doc.get_object(id).and_then(Object::as_dict) else {
            return 0;
        };

        if let Ok(value) = dict.get(b"Rotate") {
            let degrees = match value {
                Object::Reference(r) => doc
                    .get_object(*r)
                    .and_then(Object::as_i64)
                    .unwrap_or(0),
                other => other.as_i64().unwrap_or(0),
            };
            return degrees.rem_euclid(360);
        }

        match dict.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => id = parent,
            Err(_) => return 0,
        }
    }
}
