// lopdf helper - Pure Rust PDF operations
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::Path;

use crate::types::Result;

/// Load a PDF document using lopdf
pub fn load_pdf(path: &Path) -> Result<Document> {
    Ok(Document::load(path)?)
}

/// Execute an operation with a PDF document. The document is dropped when
/// `f` returns, whether it succeeded or not.
pub fn with_pdf<F, R>(path: &Path, f: F) -> Result<R>
where
    F: FnOnce(&Document) -> Result<R>,
{
    let document = load_pdf(path)?;
    f(&document)
}

/// Page object ids in page order (index 0 is the first page)
pub fn page_ids(document: &Document) -> Vec<ObjectId> {
    document.get_pages().into_values().collect()
}

/// Follow a reference chain to the object it points at
pub fn resolve<'a>(document: &'a Document, object: &'a Object) -> Result<&'a Object> {
    let mut current = object;
    // Bounded so a reference cycle cannot spin forever
    for _ in 0..32 {
        match current {
            Object::Reference(id) => current = document.get_object(*id)?,
            _ => return Ok(current),
        }
    }
    Err(lopdf::Error::ReferenceLimit.into())
}

/// Look up `key` in `dict` and dereference the value
pub fn get_resolved<'a>(
    document: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    dict.get(key).ok().and_then(|obj| resolve(document, obj).ok())
}

/// Name value as a string, if the object is a name
pub fn name_of(object: &Object) -> Option<String> {
    match object {
        Object::Name(n) => Some(String::from_utf8_lossy(n).to_string()),
        _ => None,
    }
}

/// Integer value of `key`, accepting reals that carry an integral value
pub fn get_int(document: &Document, dict: &Dictionary, key: &[u8]) -> Option<i64> {
    match get_resolved(document, dict, key)? {
        Object::Integer(i) => Some(*i),
        Object::Real(f) => Some(*f as i64),
        _ => None,
    }
}

/// Filter names of a stream in application order
pub fn stream_filters(document: &Document, dict: &Dictionary) -> Vec<String> {
    match get_resolved(document, dict, b"Filter") {
        Some(Object::Name(n)) => vec![String::from_utf8_lossy(n).to_string()],
        Some(Object::Array(arr)) => arr
            .iter()
            .filter_map(|f| resolve(document, f).ok().and_then(name_of))
            .collect(),
        _ => Vec::new(),
    }
}
