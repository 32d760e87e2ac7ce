//! Page tree access shared by the document operations.

use crate::error::PdfToolsError;
use lopdf::{Document, Object, ObjectId};

/// Resolve the object id of the root `/Pages` node.
pub(crate) fn pages_node_id(doc: &Document) -> Result<ObjectId, PdfToolsError> {
    let root = doc
        .trailer
        .get(b"Root")
        .map_err(|_| PdfToolsError::Operation("No Root in trailer".into()))?;

    let catalog_id = root
        .as_reference()
        .map_err(|_| PdfToolsError::Operation("Root is not a reference".into()))?;

    let catalog = doc
        .objects
        .get(&catalog_id)
        .ok_or_else(|| PdfToolsError::Operation("Catalog not found".into()))?
        .as_dict()
        .map_err(|_| PdfToolsError::Operation("Invalid catalog".into()))?;

    catalog
        .get(b"Pages")
        .map_err(|_| PdfToolsError::Operation("No Pages in catalog".into()))?
        .as_reference()
        .map_err(|_| PdfToolsError::Operation("Pages is not a reference".into()))
}

/// Replace the root page tree's `/Kids` with `page_refs` and fix `/Count`.
pub(crate) fn set_page_kids(
    doc: &mut Document,
    page_refs: Vec<ObjectId>,
) -> Result<(), PdfToolsError> {
    let pages_id = pages_node_id(doc)?;

    let Some(Object::Dictionary(pages_dict)) = doc.objects.get_mut(&pages_id) else {
        return Err(PdfToolsError::Operation("Invalid pages dictionary".into()));
    };

    let count = page_refs.len() as i64;
    let kids = page_refs.into_iter().map(Object::Reference).collect::<Vec<_>>();
    pages_dict.set("Kids", Object::Array(kids));
    pages_dict.set("Count", Object::Integer(count));

    Ok(())
}

/// Page object ids in document page order (1-based page number order).
pub(crate) fn ordered_page_refs(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().values().copied().collect()
}
