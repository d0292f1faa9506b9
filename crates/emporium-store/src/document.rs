use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

/// Pseudo-field addressing the document id.
pub const FIELD_ID: &str = "$id";
/// Pseudo-field addressing the creation time in microseconds since the epoch.
pub const FIELD_CREATED_AT: &str = "$created_at";
/// Pseudo-field addressing the last update time in microseconds since the epoch.
pub const FIELD_UPDATED_AT: &str = "$updated_at";
/// Pseudo-field addressing the document version.
pub const FIELD_VERSION: &str = "$version";

/// A stored document: user data plus the metadata the store maintains.
///
/// `version` starts at 1 and is incremented by every write after the insert.
/// `hash` is the BLAKE3 digest of `data` and is checked on read according to
/// the collection's verification mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The unique identifier of the document.
    pub(crate) id:         String,
    /// Write counter.
    pub(crate) version:    u64,
    /// Creation timestamp.
    pub(crate) created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub(crate) updated_at: DateTime<Utc>,
    /// BLAKE3 hash of `data`.
    pub(crate) hash:       String,
    /// The JSON data of the document.
    pub(crate) data:       Value,
}

impl Document {
    /// Creates a fresh version-1 document.
    pub fn new(id: impl Into<String>, data: Value) -> Result<Self> {
        let now = Utc::now();
        let hash = emporium_crypto::hash_data(&data)?;
        Ok(Self {
            id: id.into(),
            version: 1,
            created_at: now,
            updated_at: now,
            hash,
            data,
        })
    }

    /// Returns the next version of this document holding `data`.
    pub(crate) fn revise(&self, data: Value) -> Result<Self> {
        let hash = emporium_crypto::hash_data(&data)?;
        Ok(Self {
            id: self.id.clone(),
            version: self.version.saturating_add(1),
            created_at: self.created_at,
            updated_at: Utc::now(),
            hash,
            data,
        })
    }

    pub fn id(&self) -> &str { &self.id }

    pub const fn version(&self) -> u64 { self.version }

    pub const fn created_at(&self) -> DateTime<Utc> { self.created_at }

    pub const fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    pub fn hash(&self) -> &str { &self.hash }

    pub const fn data(&self) -> &Value { &self.data }

    /// Consumes the document and returns its data.
    pub fn into_data(self) -> Value { self.data }

    /// Resolves a field path against the document.
    ///
    /// Paths are dotted (`shipping_address.city`); numeric segments index into
    /// arrays. The pseudo-fields `$id`, `$version`, `$created_at` and
    /// `$updated_at` resolve to document metadata.
    pub fn field(&self, path: &str) -> Option<Cow<'_, Value>> {
        match path {
            FIELD_ID => Some(Cow::Owned(Value::String(self.id.clone()))),
            FIELD_VERSION => Some(Cow::Owned(Value::from(self.version))),
            FIELD_CREATED_AT => Some(Cow::Owned(Value::from(self.created_at.timestamp_micros()))),
            FIELD_UPDATED_AT => Some(Cow::Owned(Value::from(self.updated_at.timestamp_micros()))),
            _ => lookup_path(&self.data, path).map(Cow::Borrowed),
        }
    }
}

/// Walks a dotted path through nested objects and arrays.
pub fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| {
        match *current {
            Value::Object(ref map) => map.get(segment),
            Value::Array(ref items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_new_document_has_version_one_and_hash() {
        let data = json!({"name": "Test", "value": 42});
        let doc = Document::new("test-id", data.clone()).unwrap();

        assert_eq!(doc.id(), "test-id");
        assert_eq!(doc.version(), 1);
        assert_eq!(doc.created_at(), doc.updated_at());
        assert_eq!(doc.hash(), emporium_crypto::hash_data(&data).unwrap());
        assert_eq!(doc.data(), &data);
    }

    #[test]
    fn test_revise_bumps_version_and_keeps_creation_time() {
        let doc = Document::new("d", json!({"a": 1})).unwrap();
        let next = doc.revise(json!({"a": 2})).unwrap();

        assert_eq!(next.version(), 2);
        assert_eq!(next.created_at(), doc.created_at());
        assert!(next.updated_at() >= doc.updated_at());
        assert_ne!(next.hash(), doc.hash());
    }

    #[test]
    fn test_field_paths() {
        let doc = Document::new(
            "order-1",
            json!({"shipping": {"city": "Oslo"}, "items": [{"qty": 2}]}),
        )
        .unwrap();

        assert_eq!(doc.field("shipping.city").unwrap().as_ref(), &json!("Oslo"));
        assert_eq!(doc.field("items.0.qty").unwrap().as_ref(), &json!(2));
        assert!(doc.field("items.5.qty").is_none());
        assert!(doc.field("shipping.city.zip").is_none());
        assert!(doc.field("missing").is_none());
    }

    #[test]
    fn test_pseudo_fields() {
        let doc = Document::new("abc", json!({})).unwrap();

        assert_eq!(doc.field(FIELD_ID).unwrap().as_ref(), &json!("abc"));
        assert_eq!(doc.field(FIELD_VERSION).unwrap().as_ref(), &json!(1));
        assert_eq!(
            doc.field(FIELD_CREATED_AT).unwrap().as_ref(),
            &json!(doc.created_at().timestamp_micros())
        );
    }

    #[test]
    fn test_document_serializes_metadata() {
        let doc = Document::new("abc", json!({"k": "v"})).unwrap();
        let stored = serde_json::to_value(&doc).unwrap();
        assert_eq!(stored["id"], "abc");
        assert_eq!(stored["version"], 1);
        assert_eq!(stored["data"]["k"], "v");

        let back: Document = serde_json::from_value(stored).unwrap();
        assert_eq!(back, doc);
    }
}
