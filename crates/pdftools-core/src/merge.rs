//! PDF merge
//!
//! Concatenates documents in upload order, preserving page order within
//! each source.

use crate::error::PdfToolsError;
use crate::tree::{ordered_page_refs, set_page_kids};
use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeMap;

/// Merge documents into one.
///
/// The first document becomes the destination; every following document
/// has its objects imported under offset ids (to avoid collisions) and its
/// pages appended to the destination page tree.
pub fn merge_documents(documents: Vec<Vec<u8>>) -> Result<Vec<u8>, PdfToolsError> {
    if documents.is_empty() {
        return Err(PdfToolsError::Operation("No documents to merge".into()));
    }

    let mut loaded = Vec::with_capacity(documents.len());
    for (i, bytes) in documents.iter().enumerate() {
        let doc = Document::load_mem(bytes).map_err(|e| {
            PdfToolsError::Parse(format!("Failed to load document {}: {}", i + 1, e))
        })?;
        loaded.push(doc);
    }

    if loaded.len() == 1 {
        return Ok(documents.into_iter().next().unwrap());
    }

    let mut dest = loaded.remove(0);
    let mut page_refs = ordered_page_refs(&dest);

    for source in loaded {
        append_document(&mut dest, source, &mut page_refs);
    }

    set_page_kids(&mut dest, page_refs)?;
    dest.compress();

    let mut buffer = Vec::new();
    dest.save_to(&mut buffer)
        .map_err(|e| PdfToolsError::Operation(format!("Failed to save merged PDF: {}", e)))?;

    Ok(buffer)
}

/// Copy every object of `source` into `dest` under offset ids and push the
/// source pages, in source order, onto `page_refs`.
fn append_document(dest: &mut Document, source: Document, page_refs: &mut Vec<ObjectId>) {
    let source_pages = ordered_page_refs(&source);
    let offset = dest.max_id;

    let mut remapped = BTreeMap::new();
    for (old_id, object) in source.objects {
        remapped.insert((old_id.0 + offset, old_id.1), offset_refs(object, offset));
    }
    dest.objects.extend(remapped);

    for (num, gen) in source_pages {
        page_refs.push((num + offset, gen));
    }

    dest.max_id = (source.max_id + offset).max(dest.max_id);
}

/// Recursively shift every indirect reference in an object by `offset`.
fn offset_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(items) => {
            Object::Array(items.into_iter().map(|o| offset_refs(o, offset)).collect())
        }
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = offset_refs(value.clone(), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = offset_refs(value.clone(), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}
