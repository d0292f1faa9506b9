use serde_json::Value;

use crate::{comparison::values_equal, Document, VerificationMode};

/// A uniqueness constraint over one or more fields.
///
/// Documents lacking any of the fields, or holding `null` in one, are not
/// indexed and therefore never conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueIndex {
    pub fields: Vec<String>,
}

impl UniqueIndex {
    /// Index over a single field.
    pub fn single(field: &str) -> Self {
        Self {
            fields: vec![field.to_owned()],
        }
    }

    /// Compound index over several fields.
    pub fn compound(fields: &[&str]) -> Self {
        Self {
            fields: fields.iter().map(|f| (*f).to_owned()).collect(),
        }
    }

    /// The indexed key of a document, or `None` if it is not indexed.
    pub fn key_of(&self, doc: &Document) -> Option<Vec<Value>> {
        self.fields
            .iter()
            .map(|field| {
                doc.field(field)
                    .filter(|v| !v.is_null())
                    .map(std::borrow::Cow::into_owned)
            })
            .collect()
    }

    /// Whether two indexed keys collide.
    pub fn keys_collide(a: &[Value], b: &[Value]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
    }
}

/// Per-collection settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CollectionOptions {
    /// Unique constraints enforced on every write.
    pub unique_indexes: Vec<UniqueIndex>,
    /// Overrides the store-wide verification mode when set.
    pub verification:   Option<VerificationMode>,
}

impl CollectionOptions {
    /// Adds a unique index.
    pub fn unique(mut self, index: UniqueIndex) -> Self {
        self.unique_indexes.push(index);
        self
    }

    /// Overrides the verification mode.
    pub const fn verification(mut self, mode: VerificationMode) -> Self {
        self.verification = Some(mode);
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_sparse_index_keys() {
        let index = UniqueIndex::compound(&["user_id", "order_id"]);
        let full = Document::new("a", json!({"user_id": "u", "order_id": "o"})).unwrap();
        let partial = Document::new("b", json!({"user_id": "u"})).unwrap();
        let null = Document::new("c", json!({"user_id": "u", "order_id": null})).unwrap();

        assert_eq!(index.key_of(&full), Some(vec![json!("u"), json!("o")]));
        assert_eq!(index.key_of(&partial), None);
        assert_eq!(index.key_of(&null), None);
    }

    #[test]
    fn test_keys_collide() {
        assert!(UniqueIndex::keys_collide(&[json!(1)], &[json!(1.0)]));
        assert!(!UniqueIndex::keys_collide(&[json!("a")], &[json!("b")]));
    }

    #[test]
    fn test_options_builder() {
        let options = CollectionOptions::default()
            .unique(UniqueIndex::single("email"))
            .verification(VerificationMode::Warn);
        assert_eq!(options.unique_indexes.len(), 1);
        assert_eq!(options.verification, Some(VerificationMode::Warn));
    }
}
