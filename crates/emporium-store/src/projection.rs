//! Document projection utilities.

use serde_json::{Map, Value};

use crate::{document::lookup_path, Document};

/// Projects a document to include only the specified (possibly dotted) fields.
///
/// Nested paths are rebuilt as nested objects. Document metadata, including
/// the hash of the full data, is kept unchanged.
pub fn project_document(doc: &Document, fields: &[String]) -> Document {
    if fields.is_empty() {
        return doc.clone();
    }
    let mut projected = Value::Object(Map::new());
    for field in fields {
        if let Some(value) = lookup_path(&doc.data, field) {
            insert_path(&mut projected, field, value.clone());
        }
    }
    Document {
        data: projected,
        ..doc.clone()
    }
}

fn insert_path(target: &mut Value, path: &str, value: Value) {
    let mut current = target;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let Value::Object(map) = current
        else {
            return;
        };
        if segments.peek().is_none() {
            map.insert(segment.to_owned(), value);
            return;
        }
        current = map
            .entry(segment.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_projection_keeps_selected_fields() {
        let doc = Document::new(
            "p",
            json!({"name": "Lamp", "price_cents": 100, "secret": true, "dims": {"w": 1, "h": 2}}),
        )
        .unwrap();
        let projected = project_document(&doc, &["name".to_owned(), "dims.h".to_owned(), "nope".to_owned()]);

        assert_eq!(projected.data(), &json!({"name": "Lamp", "dims": {"h": 2}}));
        assert_eq!(projected.id(), "p");
        assert_eq!(projected.hash(), doc.hash());
    }

    #[test]
    fn test_empty_projection_is_identity() {
        let doc = Document::new("p", json!({"a": 1})).unwrap();
        assert_eq!(project_document(&doc, &[]), doc);
    }
}
