//! Canonicalizer (spec §4.11), applied to every JSON object that feeds a
//! hash: the template-hash payload (§4.10 `fieldsHash`) and the
//! content-hash payload (§4.12).
//!
//! `serde_json`'s default `Map` (without the `preserve_order` feature) is
//! already key-sorted, so "sort object keys lexicographically" falls out
//! of simply rebuilding the object rather than needing an explicit sort
//! step.

use chrono::{DateTime, SecondsFormat, Utc};
use justifai_errors::Error;
use serde_json::{Map, Number, Value};
use unicode_normalization::UnicodeNormalization;

const DECIMAL_PLACES: u32 = 10;

/// Canonicalize a JSON value per spec §4.11 rules 1-6 (rule 7, the
/// top-level `_schema` wrapper and compact serialization, is applied by
/// [`canonicalize_to_string`]).
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Bool(b) => Value::Bool(*b),
        Value::Number(n) => canonicalize_number(n),
        Value::String(s) => canonicalize_string(s),
        Value::Array(items) => canonicalize_array(items),
        Value::Object(map) => canonicalize_object(map),
    }
}

fn canonicalize_string(s: &str) -> Value {
    if let Some(normalized) = try_canonical_date(s) {
        return Value::String(normalized);
    }
    Value::String(s.nfc().collect::<String>())
}

/// Rule 5: re-parse ISO-8601-looking strings and re-emit the same
/// canonical RFC3339 form, so two inputs that denote the same instant but
/// differ in formatting (fractional seconds, `+00:00` vs `Z`) hash
/// identically.
fn try_canonical_date(s: &str) -> Option<String> {
    let dt: DateTime<Utc> = DateTime::parse_from_rfc3339(s).ok()?.with_timezone(&Utc);
    Some(dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn canonicalize_number(n: &Number) -> Value {
    if n.is_i64() || n.is_u64() {
        return Value::Number(n.clone());
    }
    // Rule 6: non-integers truncate to 10 decimal places.
    let Some(f) = n.as_f64() else {
        return Value::Number(n.clone());
    };
    let scale = 10f64.powi(DECIMAL_PLACES as i32);
    let truncated = (f * scale).trunc() / scale;
    Number::from_f64(truncated)
        .map(Value::Number)
        .unwrap_or_else(|| Value::Number(n.clone()))
}

fn is_primitive(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

fn canonicalize_array(items: &[Value]) -> Value {
    let mut canonicalized: Vec<Value> = items.iter().map(canonicalize).collect();
    // Rule 4: sort arrays of primitive strings/numbers; arrays containing
    // structured values keep their original (now recursively canonicalized)
    // order.
    if canonicalized.iter().all(is_primitive) {
        canonicalized.sort_by(|a, b| json_primitive_cmp(a, b));
    }
    Value::Array(canonicalized)
}

fn json_primitive_cmp(a: &Value, b: &Value) -> std::cmp::Ordering {
    fn sort_key(v: &Value) -> String {
        match v {
            Value::String(s) => format!("s:{s}"),
            Value::Number(n) => format!("n:{:020.10}", n.as_f64().unwrap_or(0.0)),
            Value::Bool(b) => format!("b:{b}"),
            _ => String::new(),
        }
    }
    sort_key(a).cmp(&sort_key(b))
}

fn canonicalize_object(map: &Map<String, Value>) -> Value {
    let mut out = Map::new();
    for (key, value) in map {
        // Rule 2: drop keys whose value is null or empty string.
        if matches!(value, Value::Null) {
            continue;
        }
        if matches!(value, Value::String(s) if s.is_empty()) {
            continue;
        }
        let normalized_key = key.nfc().collect::<String>();
        out.insert(normalized_key, canonicalize(value));
    }
    // Object iteration/insertion order is already lexicographic: serde_json's
    // `Map` is a `BTreeMap` unless the `preserve_order` feature is enabled,
    // which this crate does not enable (rule 3).
    Value::Object(out)
}

/// Rule 7: serialize to compact JSON with a top-level `_schema` version
/// key. `value` must be a JSON object.
pub fn canonicalize_to_string(value: &Value, schema_version: &str) -> Result<String, Error> {
    let Value::Object(_) = value else {
        return Err(Error::validation("canonicalize_to_string requires a JSON object"));
    };
    let mut wrapped = match canonicalize(value) {
        Value::Object(map) => map,
        _ => unreachable!("canonicalize preserves the Object variant"),
    };
    wrapped.insert("_schema".to_string(), Value::String(schema_version.to_string()));
    let final_value = Value::Object(wrapped);
    serde_json::to_string(&final_value).map_err(|e| Error::validation(format!("serialize failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn drops_null_and_empty_string_fields() {
        let input = json!({"a": null, "b": "", "c": "keep"});
        let out = canonicalize(&input);
        assert_eq!(out, json!({"c": "keep"}));
    }

    #[test]
    fn sorts_object_keys() {
        let input = json!({"z": 1, "a": 2, "m": 3});
        let out = canonicalize_to_string(&input, "v1").unwrap();
        let a_pos = out.find("\"a\"").unwrap();
        let m_pos = out.find("\"m\"").unwrap();
        let z_pos = out.find("\"z\"").unwrap();
        assert!(a_pos < m_pos && m_pos < z_pos);
    }

    #[test]
    fn sorts_primitive_arrays_but_not_object_arrays() {
        let input = json!({"xs": [3, 1, 2], "objs": [{"b": 1}, {"a": 1}]});
        let out = canonicalize(&input);
        assert_eq!(out["xs"], json!([1, 2, 3]));
        // object array order preserved
        assert_eq!(out["objs"], json!([{"b": 1}, {"a": 1}]));
    }

    #[test]
    fn truncates_non_integers_to_ten_decimal_places() {
        let input = json!({"v": 1.0 / 3.0});
        let out = canonicalize(&input);
        let v = out["v"].as_f64().unwrap();
        assert_eq!(v, (1.0 / 3.0 * 1e10).trunc() / 1e10);
    }

    #[test]
    fn integers_are_left_unchanged() {
        let input = json!({"v": 42});
        assert_eq!(canonicalize(&input)["v"], json!(42));
    }

    #[test]
    fn normalizes_equivalent_iso8601_dates_identically() {
        let a = json!({"d": "2023-11-13T00:00:00Z"});
        let b = json!({"d": "2023-11-13T00:00:00.000+00:00"});
        assert_eq!(
            canonicalize_to_string(&a, "v1").unwrap(),
            canonicalize_to_string(&b, "v1").unwrap()
        );
    }

    #[test]
    fn is_idempotent() {
        let input = json!({
            "b": 2, "a": [3, 1, 2], "n": null, "s": "", "x": "Cafe\u{0301}"
        });
        let once = canonicalize(&input);
        let twice = canonicalize(&once);
        assert_eq!(
            serde_json::to_string(&once).unwrap(),
            serde_json::to_string(&twice).unwrap()
        );
    }

    #[test]
    fn unicode_strings_are_nfc_normalized() {
        // "e" + combining acute accent vs precomposed e-acute.
        let decomposed = json!({"s": "Cafe\u{0301}"});
        let precomposed = json!({"s": "Café"});
        assert_eq!(
            canonicalize_to_string(&decomposed, "v1").unwrap(),
            canonicalize_to_string(&precomposed, "v1").unwrap()
        );
    }

    #[test]
    fn schema_key_is_present_at_top_level() {
        let out = canonicalize_to_string(&json!({"a": 1}), "v2").unwrap();
        assert!(out.contains("\"_schema\":\"v2\""));
    }
}
