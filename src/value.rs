//! The shared immutable JSON value model.
//!
//! Every stage of the engine moves [`JsonValue`]s around. The scalar
//! variants are inline; strings, arrays and objects sit behind `Rc`, so
//! cloning a value is cheap and outputs can share subtrees of the input.
//! Objects are `BTreeMap`s: iteration, `keys`, `to_entries` and
//! serialization all see entries in ascending byte-wise key order.

#[cfg(not(test))]
use alloc::collections::BTreeMap;
#[cfg(not(test))]
use alloc::format;
#[cfg(not(test))]
use alloc::rc::Rc;
#[cfg(not(test))]
use alloc::string::{String, ToString};
#[cfg(not(test))]
use alloc::vec::Vec;

#[cfg(test)]
use std::collections::BTreeMap;
#[cfg(test)]
use std::rc::Rc;

use serde_json::Value;

/// A JSON value.
///
/// Structural access is total: looking up a missing key, an out-of-range
/// index, or a field on a non-object yields [`JsonValue::Null`] rather than
/// an error. Values are immutable once built; [`array_push`] and
/// [`object_set`] exist for the construction phase only and copy-on-write
/// when the payload is shared.
///
/// [`array_push`]: JsonValue::array_push
/// [`object_set`]: JsonValue::object_set
#[derive(Debug, Clone, PartialEq)]
pub enum JsonValue {
    /// JSON null
    Null,
    /// JSON boolean
    Bool(bool),
    /// JSON number (IEEE-754 double)
    Number(f64),
    /// JSON string
    String(Rc<str>),
    /// JSON array
    Array(Rc<Vec<JsonValue>>),
    /// JSON object, iterated in sorted key order
    Object(Rc<BTreeMap<String, JsonValue>>),
}

impl JsonValue {
    /// Create a null value.
    pub fn null() -> Self {
        JsonValue::Null
    }

    /// Create a boolean value.
    pub fn boolean(b: bool) -> Self {
        JsonValue::Bool(b)
    }

    /// Create a number value.
    pub fn number(n: f64) -> Self {
        JsonValue::Number(n)
    }

    /// Create a string value.
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        JsonValue::String(s.into())
    }

    /// Create an empty array.
    pub fn array() -> Self {
        JsonValue::Array(Rc::new(Vec::new()))
    }

    /// Create an array from a vector of values.
    pub fn array_from(values: Vec<JsonValue>) -> Self {
        JsonValue::Array(Rc::new(values))
    }

    /// Create an empty object.
    pub fn object() -> Self {
        JsonValue::Object(Rc::new(BTreeMap::new()))
    }

    /// Create an object from key-value pairs. Duplicate keys keep the last
    /// value.
    pub fn object_from(pairs: impl IntoIterator<Item = (String, JsonValue)>) -> Self {
        JsonValue::Object(Rc::new(pairs.into_iter().collect()))
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, JsonValue::Null)
    }

    /// Check if this value is a boolean.
    pub fn is_boolean(&self) -> bool {
        matches!(self, JsonValue::Bool(_))
    }

    /// Check if this value is a number.
    pub fn is_number(&self) -> bool {
        matches!(self, JsonValue::Number(_))
    }

    /// Check if this value is a string.
    pub fn is_string(&self) -> bool {
        matches!(self, JsonValue::String(_))
    }

    /// Check if this value is an array.
    pub fn is_array(&self) -> bool {
        matches!(self, JsonValue::Array(_))
    }

    /// Check if this value is an object.
    pub fn is_object(&self) -> bool {
        matches!(self, JsonValue::Object(_))
    }

    /// Check if this value is a number with zero fractional part.
    pub fn is_integer(&self) -> bool {
        matches!(self, JsonValue::Number(n) if n.is_finite() && n.fract() == 0.0)
    }

    /// Get the type name of this value (`null`, `boolean`, `number`,
    /// `string`, `array`, `object`).
    pub fn type_name(&self) -> &'static str {
        match self {
            JsonValue::Null => "null",
            JsonValue::Bool(_) => "boolean",
            JsonValue::Number(_) => "number",
            JsonValue::String(_) => "string",
            JsonValue::Array(_) => "array",
            JsonValue::Object(_) => "object",
        }
    }

    /// Convert to an f64, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            JsonValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Convert to a string reference, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsonValue::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    /// The value's length: element count for arrays and objects, byte
    /// length for strings, 0 for everything else.
    pub fn len(&self) -> usize {
        match self {
            JsonValue::String(s) => s.len(),
            JsonValue::Array(a) => a.len(),
            JsonValue::Object(o) => o.len(),
            _ => 0,
        }
    }

    /// Check if this value has length zero.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the element at `i`, or `Null` for a non-array or an index past
    /// the end.
    pub fn array_index(&self, i: usize) -> JsonValue {
        match self {
            JsonValue::Array(a) => a.get(i).cloned().unwrap_or(JsonValue::Null),
            _ => JsonValue::Null,
        }
    }

    /// Get the value under `key`, or `Null` for a non-object or a missing
    /// key.
    pub fn object_get(&self, key: &str) -> JsonValue {
        match self {
            JsonValue::Object(o) => o.get(key).cloned().unwrap_or(JsonValue::Null),
            _ => JsonValue::Null,
        }
    }

    /// Append `v` if this value is an array; no-op otherwise.
    pub fn array_push(&mut self, v: JsonValue) {
        if let JsonValue::Array(a) = self {
            Rc::make_mut(a).push(v);
        }
    }

    /// Insert `v` under `key` if this value is an object; no-op otherwise.
    pub fn object_set(&mut self, key: impl Into<String>, v: JsonValue) {
        if let JsonValue::Object(o) = self {
            Rc::make_mut(o).insert(key.into(), v);
        }
    }

    /// Serialize to compact JSON text.
    ///
    /// Integer-valued numbers print without a decimal point; the test is
    /// `fract() == 0.0`, so doubles at or above 2^53 always format as
    /// integers. Non-finite numbers print as `null`. In strings, only `"`,
    /// `\`, LF, CR and TAB are escaped; other control characters and
    /// non-ASCII pass through verbatim. Object keys come out sorted.
    pub fn to_json(&self) -> String {
        match self {
            JsonValue::Null => "null".to_string(),
            JsonValue::Bool(true) => "true".to_string(),
            JsonValue::Bool(false) => "false".to_string(),
            JsonValue::Number(n) => format_number(*n),
            JsonValue::String(s) => format!("\"{}\"", escape_json_string(s)),
            JsonValue::Array(a) => {
                let elements: Vec<String> = a.iter().map(JsonValue::to_json).collect();
                format!("[{}]", elements.join(","))
            }
            JsonValue::Object(o) => {
                let entries: Vec<String> = o
                    .iter()
                    .map(|(k, v)| format!("\"{}\":{}", escape_json_string(k), v.to_json()))
                    .collect();
                format!("{{{}}}", entries.join(","))
            }
        }
    }

    /// Parse JSON text via the serde_json DOM parser.
    pub fn from_json_text(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Value>(text).map(JsonValue::from)
    }
}

/// Format a number: no fraction when integer-valued, `null` when not finite.
fn format_number(n: f64) -> String {
    if !n.is_finite() {
        "null".to_string()
    } else if n.fract() == 0.0 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

/// Escape a string for JSON output.
fn escape_json_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c => result.push(c),
        }
    }
    result
}

impl From<bool> for JsonValue {
    fn from(b: bool) -> Self {
        JsonValue::Bool(b)
    }
}

impl From<f64> for JsonValue {
    fn from(n: f64) -> Self {
        JsonValue::Number(n)
    }
}

impl From<&str> for JsonValue {
    fn from(s: &str) -> Self {
        JsonValue::String(Rc::from(s))
    }
}

impl From<Value> for JsonValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(b),
            Value::Number(n) => JsonValue::Number(n.as_f64().unwrap_or(0.0)),
            Value::String(s) => JsonValue::String(Rc::from(s.as_str())),
            Value::Array(arr) => {
                JsonValue::Array(Rc::new(arr.into_iter().map(JsonValue::from).collect()))
            }
            Value::Object(obj) => {
                let map: BTreeMap<String, JsonValue> = obj
                    .into_iter()
                    .map(|(k, v)| (k, JsonValue::from(v)))
                    .collect();
                JsonValue::Object(Rc::new(map))
            }
        }
    }
}

impl From<&JsonValue> for Value {
    fn from(jv: &JsonValue) -> Self {
        match jv {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            JsonValue::String(s) => Value::String(s.to_string()),
            JsonValue::Array(a) => Value::Array(a.iter().map(Value::from).collect()),
            JsonValue::Object(o) => {
                let map: serde_json::Map<String, Value> = o
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect();
                Value::Object(map)
            }
        }
    }
}
