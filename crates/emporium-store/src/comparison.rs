//! Ordering and equality of JSON values for filtering and sorting.

use std::cmp::Ordering;

use serde_json::Value;

const fn type_order(v: &Value) -> u8 {
    match *v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values: Null < Bool < Number < String < Array < Object.
///
/// Numbers compare numerically, strings lexicographically, arrays element by
/// element and objects by size.
pub fn compare_json_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (&Value::Bool(ba), &Value::Bool(bb)) => ba.cmp(&bb),
        (&Value::Number(ref na), &Value::Number(ref nb)) => compare_numbers(na, nb),
        (&Value::String(ref sa), &Value::String(ref sb)) => sa.cmp(sb),
        (&Value::Array(ref aa), &Value::Array(ref ab)) => {
            aa.iter()
                .zip(ab.iter())
                .map(|(x, y)| compare_json_values(x, y))
                .find(|o| o.is_ne())
                .unwrap_or_else(|| aa.len().cmp(&ab.len()))
        },
        (&Value::Object(ref oa), &Value::Object(ref ob)) => oa.len().cmp(&ob.len()),
        _ => type_order(a).cmp(&type_order(b)),
    }
}

fn compare_numbers(a: &serde_json::Number, b: &serde_json::Number) -> Ordering {
    if let (Some(ia), Some(ib)) = (a.as_i64(), b.as_i64()) {
        return ia.cmp(&ib);
    }
    let fa = a.as_f64().unwrap_or(0.0);
    let fb = b.as_f64().unwrap_or(0.0);
    fa.total_cmp(&fb)
}

/// Compares two optional values; a missing value sorts before any value.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(va), Some(vb)) => compare_json_values(va, vb),
    }
}

/// Equality where `1` and `1.0` are the same number.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (&Value::Number(ref na), &Value::Number(ref nb)) => compare_numbers(na, nb).is_eq(),
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_type_ordering() {
        let ordered = [json!(null), json!(false), json!(3), json!("a"), json!([1]), json!({"a": 1})];
        for pair in ordered.windows(2) {
            assert_eq!(compare_json_values(&pair[0], &pair[1]), Ordering::Less);
            assert_eq!(compare_json_values(&pair[1], &pair[0]), Ordering::Greater);
        }
    }

    #[test]
    fn test_numbers_compare_numerically() {
        assert_eq!(compare_json_values(&json!(2), &json!(10)), Ordering::Less);
        assert_eq!(compare_json_values(&json!(1.5), &json!(1)), Ordering::Greater);
        assert_eq!(compare_json_values(&json!(-3), &json!(2.5)), Ordering::Less);
        assert!(values_equal(&json!(1), &json!(1.0)));
        assert!(!values_equal(&json!(1), &json!("1")));
    }

    #[test]
    fn test_strings_and_arrays() {
        assert_eq!(compare_json_values(&json!("a"), &json!("b")), Ordering::Less);
        assert_eq!(compare_json_values(&json!([1, 2]), &json!([1, 3])), Ordering::Less);
        assert_eq!(compare_json_values(&json!([1]), &json!([1, 0])), Ordering::Less);
        assert_eq!(compare_json_values(&json!({"a": 1}), &json!({"b": 2})), Ordering::Equal);
    }

    #[test]
    fn test_missing_sorts_first() {
        assert_eq!(compare_values(None, None), Ordering::Equal);
        assert_eq!(compare_values(None, Some(&json!(null))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(1)), None), Ordering::Greater);
        assert_eq!(compare_values(Some(&json!(1)), Some(&json!(2))), Ordering::Less);
    }
}
