//! Filtering utilities for document matching.

use std::cmp::Ordering;

use serde_json::Value;

use crate::{
    comparison::{compare_json_values, values_equal},
    Document,
    Filter,
};

/// Checks if a document matches all the given filters.
pub fn matches_filters(doc: &Document, filters: &[Filter]) -> bool { filters.iter().all(|f| matches_filter(doc, f)) }

/// Checks a single filter against a document.
pub fn matches_filter(doc: &Document, filter: &Filter) -> bool {
    match *filter {
        Filter::Equals(ref field, ref value) => field_equals(doc, field, value),
        Filter::NotEquals(ref field, ref value) => !field_equals(doc, field, value),
        Filter::GreaterThan(ref field, ref value) => compare_field(doc, field, value).is_some_and(Ordering::is_gt),
        Filter::LessThan(ref field, ref value) => compare_field(doc, field, value).is_some_and(Ordering::is_lt),
        Filter::GreaterOrEqual(ref field, ref value) => compare_field(doc, field, value).is_some_and(Ordering::is_ge),
        Filter::LessOrEqual(ref field, ref value) => compare_field(doc, field, value).is_some_and(Ordering::is_le),
        Filter::Contains(ref field, ref needle) => string_test(doc, field, |s| s.contains(needle.as_str())),
        Filter::ContainsInsensitive(ref field, ref needle) => {
            let needle = needle.to_lowercase();
            string_test(doc, field, |s| s.to_lowercase().contains(&needle))
        },
        Filter::StartsWith(ref field, ref prefix) => {
            doc.field(field)
                .is_some_and(|v| v.as_str().is_some_and(|s| s.starts_with(prefix.as_str())))
        },
        Filter::EndsWith(ref field, ref suffix) => {
            doc.field(field)
                .is_some_and(|v| v.as_str().is_some_and(|s| s.ends_with(suffix.as_str())))
        },
        Filter::In(ref field, ref values) => {
            doc.field(field)
                .is_some_and(|v| values.iter().any(|candidate| values_equal(&v, candidate)))
        },
        Filter::Exists(ref field, exists) => doc.field(field).is_some() == exists,
        Filter::And(ref inner) => inner.iter().all(|f| matches_filter(doc, f)),
        Filter::Or(ref inner) => inner.iter().any(|f| matches_filter(doc, f)),
        Filter::Not(ref inner) => !matches_filter(doc, inner),
    }
}

fn field_equals(doc: &Document, field: &str, value: &Value) -> bool {
    doc.field(field)
        .map_or(value.is_null(), |v| values_equal(&v, value))
}

/// Ordering of the field relative to `value`, only defined for two numbers or
/// two strings.
fn compare_field(doc: &Document, field: &str, value: &Value) -> Option<Ordering> {
    let current = doc.field(field)?;
    match (current.as_ref(), value) {
        (&Value::Number(_), &Value::Number(_)) | (&Value::String(_), &Value::String(_)) => {
            Some(compare_json_values(&current, value))
        },
        _ => None,
    }
}

fn string_test(doc: &Document, field: &str, test: impl Fn(&str) -> bool) -> bool {
    match doc.field(field).as_deref() {
        Some(&Value::String(ref s)) => test(s),
        Some(&Value::Array(ref items)) => items.iter().any(|v| v.as_str().is_some_and(&test)),
        Some(_) | None => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn create_doc(data: Value) -> Document { Document::new("test", data).unwrap() }

    fn eq(field: &str, value: Value) -> Filter { Filter::Equals(field.to_owned(), value) }

    #[test]
    fn test_equals_and_not_equals() {
        let doc = create_doc(json!({"name": "Alice", "age": 25, "deleted": null}));
        assert!(matches_filters(&doc, &[eq("name", json!("Alice"))]));
        assert!(!matches_filters(&doc, &[eq("name", json!("Bob"))]));
        assert!(matches_filters(&doc, &[eq("age", json!(25.0))]));
        assert!(matches_filters(&doc, &[eq("missing", json!(null))]));
        assert!(matches_filters(&doc, &[eq("deleted", json!(null))]));
        assert!(matches_filters(
            &doc,
            &[Filter::NotEquals("name".to_owned(), json!("Bob"))]
        ));
    }

    #[test]
    fn test_range_filters() {
        let doc = create_doc(json!({"price_cents": 2500, "name": "m"}));
        let gt = |v| Filter::GreaterThan("price_cents".to_owned(), v);
        assert!(matches_filter(&doc, &gt(json!(2000))));
        assert!(!matches_filter(&doc, &gt(json!(2500))));
        assert!(matches_filter(
            &doc,
            &Filter::GreaterOrEqual("price_cents".to_owned(), json!(2500))
        ));
        assert!(matches_filter(
            &doc,
            &Filter::LessOrEqual("price_cents".to_owned(), json!(2500))
        ));
        assert!(matches_filter(&doc, &Filter::LessThan("name".to_owned(), json!("z"))));
        // Mixed types never compare
        assert!(!matches_filter(&doc, &Filter::GreaterThan("name".to_owned(), json!(1))));
        assert!(!matches_filter(&doc, &Filter::LessThan("missing".to_owned(), json!(1))));
    }

    #[test]
    fn test_string_filters() {
        let doc = create_doc(json!({"name": "Desk Lamp", "tags": ["Office", "light"]}));
        assert!(matches_filter(&doc, &Filter::Contains("name".to_owned(), "Lamp".to_owned())));
        assert!(!matches_filter(&doc, &Filter::Contains("name".to_owned(), "lamp".to_owned())));
        assert!(matches_filter(
            &doc,
            &Filter::ContainsInsensitive("name".to_owned(), "lAMp".to_owned())
        ));
        assert!(matches_filter(
            &doc,
            &Filter::ContainsInsensitive("tags".to_owned(), "office".to_owned())
        ));
        assert!(matches_filter(&doc, &Filter::StartsWith("name".to_owned(), "Desk".to_owned())));
        assert!(matches_filter(&doc, &Filter::EndsWith("name".to_owned(), "Lamp".to_owned())));
        assert!(!matches_filter(&doc, &Filter::EndsWith("name".to_owned(), "Desk".to_owned())));
    }

    #[test]
    fn test_in_and_exists() {
        let doc = create_doc(json!({"status": "paid", "address": {"city": "Oslo"}}));
        assert!(matches_filter(
            &doc,
            &Filter::In("status".to_owned(), vec![json!("pending"), json!("paid")])
        ));
        assert!(!matches_filter(&doc, &Filter::In("status".to_owned(), vec![])));
        assert!(matches_filter(&doc, &Filter::Exists("address.city".to_owned(), true)));
        assert!(matches_filter(&doc, &Filter::Exists("address.zip".to_owned(), false)));
    }

    #[test]
    fn test_logical_combinators() {
        let doc = create_doc(json!({"name": "Alice", "age": 25}));
        let young = Filter::LessThan("age".to_owned(), json!(30));
        let bob = eq("name", json!("Bob"));

        assert!(matches_filter(&doc, &Filter::Or(vec![bob.clone(), young.clone()])));
        assert!(!matches_filter(&doc, &Filter::And(vec![bob.clone(), young.clone()])));
        assert!(matches_filter(&doc, &Filter::Not(Box::new(bob))));
        assert!(matches_filter(&doc, &Filter::And(vec![])));
        assert!(!matches_filter(&doc, &Filter::Or(vec![])));
    }

    #[test]
    fn test_pseudo_field_filters() {
        let doc = create_doc(json!({}));
        assert!(matches_filter(&doc, &eq("$id", json!("test"))));
        assert!(matches_filter(&doc, &Filter::GreaterThan("$created_at".to_owned(), json!(0))));
    }
}
