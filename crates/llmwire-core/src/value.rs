//! Dynamically-typed JSON values for schema-free payloads
//!
//! Tool parameters and JSON-schema blobs have a shape that is defined by the
//! caller or the provider at runtime, so they are carried as [`WireValue`]
//! instead of static structs. Objects are kept in a `BTreeMap`, which makes
//! encoding a pure function of the value: the same value always produces the
//! same bytes.

use crate::error::LlmError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

/// Mapping type used for wire objects
pub type WireMap = BTreeMap<String, WireValue>;

/// A JSON value with deterministic object key order
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WireValue {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<WireValue>),
    Object(WireMap),
}

impl WireValue {
    /// An empty object, distinct from `Null` and from an empty array
    pub fn object() -> Self {
        WireValue::Object(WireMap::new())
    }

    /// Parse external JSON text into a value
    pub fn parse(text: &str) -> Result<Self, LlmError> {
        serde_json::from_str::<serde_json::Value>(text)
            .map(WireValue::from)
            .map_err(|e| LlmError::malformed_value(fragment_around(text, e.column()), e))
    }

    /// Parse external JSON bytes into a value
    pub fn from_slice(bytes: &[u8]) -> Result<Self, LlmError> {
        match std::str::from_utf8(bytes) {
            Ok(text) => Self::parse(text),
            Err(e) => Err(LlmError::malformed_value(
                String::from_utf8_lossy(bytes).into_owned(),
                e,
            )),
        }
    }

    /// Serialize to compact JSON bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        // Keys are strings and numbers are always finite, so this cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Serialize to a compact JSON string
    pub fn to_json_string(&self) -> String {
        String::from_utf8(self.to_bytes()).unwrap_or_default()
    }

    /// Insert a key into an object value, builder style.
    ///
    /// Non-object values are replaced by a fresh object first.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<WireValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a key only when the value is present
    pub fn with_opt<V: Into<WireValue>>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.insert(key, value);
        }
        self
    }

    /// Insert a key into an object value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<WireValue>) {
        if !matches!(self, WireValue::Object(_)) {
            *self = WireValue::object();
        }
        if let WireValue::Object(map) = self {
            map.insert(key.into(), value.into());
        }
    }

    pub fn get(&self, key: &str) -> Option<&WireValue> {
        match self {
            WireValue::Object(map) => map.get(key),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, WireValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            WireValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            WireValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            WireValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            WireValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[WireValue]> {
        match self {
            WireValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&WireMap> {
        match self {
            WireValue::Object(map) => Some(map),
            _ => None,
        }
    }
}

/// A short excerpt of `text` around the failing column, for error messages
fn fragment_around(text: &str, column: usize) -> String {
    const CONTEXT: usize = 24;
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= CONTEXT * 2 {
        return text.to_string();
    }
    let center = column.saturating_sub(1).min(chars.len());
    let start = center.saturating_sub(CONTEXT);
    let end = (center + CONTEXT).min(chars.len());
    chars[start..end].iter().collect()
}

impl Serialize for WireValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WireValue::Null => serializer.serialize_unit(),
            WireValue::Bool(b) => serializer.serialize_bool(*b),
            WireValue::Number(n) => n.serialize(serializer),
            WireValue::String(s) => serializer.serialize_str(s),
            WireValue::Array(items) => items.serialize(serializer),
            WireValue::Object(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for WireValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(WireValue::from)
    }
}

impl From<serde_json::Value> for WireValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => WireValue::Null,
            serde_json::Value::Bool(b) => WireValue::Bool(b),
            serde_json::Value::Number(n) => WireValue::Number(n),
            serde_json::Value::String(s) => WireValue::String(s),
            serde_json::Value::Array(items) => {
                WireValue::Array(items.into_iter().map(WireValue::from).collect())
            }
            serde_json::Value::Object(map) => WireValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, WireValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<WireValue> for serde_json::Value {
    fn from(value: WireValue) -> Self {
        match value {
            WireValue::Null => serde_json::Value::Null,
            WireValue::Bool(b) => serde_json::Value::Bool(b),
            WireValue::Number(n) => serde_json::Value::Number(n),
            WireValue::String(s) => serde_json::Value::String(s),
            WireValue::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            WireValue::Object(map) => serde_json::Value::Object(
                map.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}

impl From<bool> for WireValue {
    fn from(b: bool) -> Self {
        WireValue::Bool(b)
    }
}

impl From<&str> for WireValue {
    fn from(s: &str) -> Self {
        WireValue::String(s.to_string())
    }
}

impl From<String> for WireValue {
    fn from(s: String) -> Self {
        WireValue::String(s)
    }
}

impl From<&String> for WireValue {
    fn from(s: &String) -> Self {
        WireValue::String(s.clone())
    }
}

macro_rules! wire_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for WireValue {
                fn from(n: $ty) -> Self {
                    WireValue::Number(serde_json::Number::from(n))
                }
            }
        )*
    };
}

wire_from_integer!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl From<f64> for WireValue {
    /// Non-finite floats have no JSON form and become `Null`
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n)
            .map(WireValue::Number)
            .unwrap_or(WireValue::Null)
    }
}

impl From<f32> for WireValue {
    fn from(n: f32) -> Self {
        // Go through the shortest decimal form so 0.7f32 encodes as 0.7
        n.to_string()
            .parse::<f64>()
            .map(WireValue::from)
            .unwrap_or(WireValue::Null)
    }
}

impl<T: Into<WireValue>> From<Option<T>> for WireValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(WireValue::Null)
    }
}

impl<T: Into<WireValue>> From<Vec<T>> for WireValue {
    fn from(items: Vec<T>) -> Self {
        WireValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<WireValue>> From<BTreeMap<K, V>> for WireValue {
    fn from(map: BTreeMap<K, V>) -> Self {
        WireValue::Object(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<WireValue>> From<HashMap<K, V>> for WireValue {
    fn from(map: HashMap<K, V>) -> Self {
        WireValue::Object(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<T: Into<WireValue>> FromIterator<T> for WireValue {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        WireValue::Array(iter.into_iter().map(Into::into).collect())
    }
}

impl std::fmt::Display for WireValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_json_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_containers_are_not_null() {
        assert_eq!(WireValue::object().to_json_string(), "{}");
        assert_eq!(WireValue::Array(vec![]).to_json_string(), "[]");
        assert_eq!(WireValue::Null.to_json_string(), "null");
        assert_ne!(WireValue::object(), WireValue::Null);
    }

    #[test]
    fn test_object_encoding_is_stable_regardless_of_insertion_order() {
        let a = WireValue::object().with("b", 1).with("a", "x").with("c", true);
        let b = WireValue::object().with("c", true).with("a", "x").with("b", 1);
        assert_eq!(a.to_bytes(), b.to_bytes());
        assert_eq!(a.to_json_string(), r#"{"a":"x","b":1,"c":true}"#);
    }

    #[test]
    fn test_hashmap_conversion_encodes_every_key_once() {
        let mut map = HashMap::new();
        for i in 0..32 {
            map.insert(format!("k{i}"), i);
        }
        let value = WireValue::from(map);
        let reparsed: serde_json::Value = serde_json::from_slice(&value.to_bytes()).unwrap();
        assert_eq!(reparsed.as_object().unwrap().len(), 32);
        assert_eq!(value.to_bytes(), value.clone().to_bytes());
    }

    #[test]
    fn test_non_finite_floats_become_null() {
        assert!(WireValue::from(f64::NAN).is_null());
        assert!(WireValue::from(f64::INFINITY).is_null());
        assert_eq!(WireValue::from(0.7f32).to_json_string(), "0.7");
    }

    #[test]
    fn test_parse_nested_schema() {
        let value = WireValue::parse(
            r#"{"type":"object","properties":{"city":{"type":"string"}},"required":["city"]}"#,
        )
        .unwrap();
        assert_eq!(value.get("type").and_then(WireValue::as_str), Some("object"));
        assert_eq!(
            value.get("required").and_then(WireValue::as_array).map(|a| a.len()),
            Some(1)
        );
        assert!(value.get("properties").unwrap().get("city").is_some());
    }

    #[test]
    fn test_parse_malformed_reports_fragment() {
        let err = WireValue::parse(r#"{"type": obj}"#).unwrap_err();
        match err {
            LlmError::MalformedValue { fragment, .. } => assert!(fragment.contains("obj")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_from_slice_rejects_invalid_utf8() {
        let err = WireValue::from_slice(&[0x7b, 0xff, 0x7d]).unwrap_err();
        assert!(matches!(err, LlmError::MalformedValue { .. }));
    }

    #[test]
    fn test_serde_json_round_trip_preserves_integers() {
        let original = serde_json::json!({"n": 9007199254740993u64, "f": 1.5, "list": [null, false]});
        let wire = WireValue::from(original.clone());
        assert_eq!(serde_json::Value::from(wire.clone()), original);
        assert_eq!(wire.get("n").and_then(WireValue::as_i64), Some(9007199254740993));
    }

    #[test]
    fn test_insert_on_scalar_replaces_with_object() {
        let mut value = WireValue::from("text");
        value.insert("k", 1);
        assert_eq!(value.to_json_string(), r#"{"k":1}"#);
    }
}
