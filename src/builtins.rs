//! Builtin functions callable from filter source.
//!
//! A [`Builtins`] table maps builtin names to plain function pointers. The
//! engine owns a table and the executor borrows it, so there is no
//! process-wide registry: independent engines are fully isolated and tests
//! cannot couple through registration order. Custom builtins registered at
//! runtime share the default contract: append zero or more outputs, or fail
//! with a message naming the builtin.
//!
//! Precondition failures (`sort` on a non-array, `keys` on a scalar) are
//! errors; structural lookups stay total and yield `Null` elsewhere in the
//! engine.

#[cfg(not(test))]
use alloc::collections::BTreeMap;
#[cfg(not(test))]
use alloc::format;
#[cfg(not(test))]
use alloc::string::String;
#[cfg(not(test))]
use alloc::vec::Vec;

#[cfg(test)]
use std::collections::BTreeMap;

use core::cmp::Ordering;

use crate::exec::ExecError;
use crate::value::JsonValue;

/// A builtin: reads the input value, appends zero or more outputs.
pub type BuiltinFn = fn(&JsonValue, &mut Vec<JsonValue>) -> Result<(), ExecError>;

/// A name-to-function table of builtins.
#[derive(Clone)]
pub struct Builtins {
    table: BTreeMap<String, BuiltinFn>,
}

impl Builtins {
    /// Create a table holding the default builtins: `keys`, `values`,
    /// `type`, `length`, `empty`, `reverse`, `sort`, `to_entries`.
    pub fn new() -> Self {
        let mut builtins = Builtins {
            table: BTreeMap::new(),
        };
        builtins.register("keys", keys);
        builtins.register("values", values);
        builtins.register("type", type_of);
        builtins.register("length", length);
        builtins.register("empty", empty);
        builtins.register("reverse", reverse);
        builtins.register("sort", sort);
        builtins.register("to_entries", to_entries);
        builtins
    }

    /// Add or replace a builtin.
    pub fn register(&mut self, name: impl Into<String>, f: BuiltinFn) {
        self.table.insert(name.into(), f);
    }

    /// Check whether a builtin is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Invoke the builtin registered under `name`.
    pub fn call(
        &self,
        name: &str,
        input: &JsonValue,
        outputs: &mut Vec<JsonValue>,
    ) -> Result<(), ExecError> {
        match self.table.get(name) {
            Some(f) => f(input, outputs),
            None => Err(ExecError::new(format!("unknown builtin: {}", name))),
        }
    }
}

impl Default for Builtins {
    fn default() -> Self {
        Builtins::new()
    }
}

impl core::fmt::Debug for Builtins {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Builtins")
            .field("names", &self.table.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// `keys`: sorted object keys, or array indices `[0 .. length)`.
fn keys(input: &JsonValue, outputs: &mut Vec<JsonValue>) -> Result<(), ExecError> {
    let mut result = JsonValue::array();
    match input {
        JsonValue::Object(o) => {
            for key in o.keys() {
                result.array_push(JsonValue::string(key.as_str()));
            }
        }
        JsonValue::Array(a) => {
            for i in 0..a.len() {
                result.array_push(JsonValue::number(i as f64));
            }
        }
        _ => {
            return Err(ExecError::new("keys: input must be object or array"));
        }
    }
    outputs.push(result);
    Ok(())
}

/// `values`: every object value in sorted-key order, or every array
/// element, each as a separate output.
fn values(input: &JsonValue, outputs: &mut Vec<JsonValue>) -> Result<(), ExecError> {
    match input {
        JsonValue::Object(o) => {
            for value in o.values() {
                outputs.push(value.clone());
            }
            Ok(())
        }
        JsonValue::Array(a) => {
            for element in a.iter() {
                outputs.push(element.clone());
            }
            Ok(())
        }
        _ => Err(ExecError::new("values: input must be object or array")),
    }
}

/// `type`: the variant name as a string.
fn type_of(input: &JsonValue, outputs: &mut Vec<JsonValue>) -> Result<(), ExecError> {
    outputs.push(JsonValue::string(input.type_name()));
    Ok(())
}

/// `length`: element count for arrays and objects, byte length for
/// strings, 0 for everything else.
fn length(input: &JsonValue, outputs: &mut Vec<JsonValue>) -> Result<(), ExecError> {
    outputs.push(JsonValue::number(input.len() as f64));
    Ok(())
}

/// `empty`: no outputs.
fn empty(_input: &JsonValue, _outputs: &mut Vec<JsonValue>) -> Result<(), ExecError> {
    Ok(())
}

/// `reverse`: a reversed string or array.
fn reverse(input: &JsonValue, outputs: &mut Vec<JsonValue>) -> Result<(), ExecError> {
    match input {
        JsonValue::String(s) => {
            let reversed: String = s.chars().rev().collect();
            outputs.push(JsonValue::string(reversed));
            Ok(())
        }
        JsonValue::Array(a) => {
            let reversed: Vec<JsonValue> = a.iter().rev().cloned().collect();
            outputs.push(JsonValue::array_from(reversed));
            Ok(())
        }
        _ => Err(ExecError::new("reverse: input must be string or array")),
    }
}

/// Rank used to order values of different types:
/// null < boolean < number < string < array < object.
fn type_rank(v: &JsonValue) -> u8 {
    match v {
        JsonValue::Null => 0,
        JsonValue::Bool(_) => 1,
        JsonValue::Number(_) => 2,
        JsonValue::String(_) => 3,
        JsonValue::Array(_) => 4,
        JsonValue::Object(_) => 5,
    }
}

/// `sort`: a stably sorted array; numbers and strings compare by value,
/// everything else by type rank only.
fn sort(input: &JsonValue, outputs: &mut Vec<JsonValue>) -> Result<(), ExecError> {
    let JsonValue::Array(a) = input else {
        return Err(ExecError::new("sort: input must be array"));
    };
    let mut elements: Vec<JsonValue> = a.iter().cloned().collect();
    elements.sort_by(|x, y| match (x, y) {
        (JsonValue::Number(m), JsonValue::Number(n)) => {
            m.partial_cmp(n).unwrap_or(Ordering::Equal)
        }
        (JsonValue::String(s), JsonValue::String(t)) => s.cmp(t),
        _ => type_rank(x).cmp(&type_rank(y)),
    });
    outputs.push(JsonValue::array_from(elements));
    Ok(())
}

/// `to_entries`: `{"k":v}` becomes `[{"key":"k","value":v}]` in sorted-key
/// order.
fn to_entries(input: &JsonValue, outputs: &mut Vec<JsonValue>) -> Result<(), ExecError> {
    let JsonValue::Object(o) = input else {
        return Err(ExecError::new("to_entries: input must be object"));
    };
    let mut result = JsonValue::array();
    for (key, value) in o.iter() {
        let mut entry = JsonValue::object();
        entry.object_set("key", JsonValue::string(key.as_str()));
        entry.object_set("value", value.clone());
        result.array_push(entry);
    }
    outputs.push(result);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, input: &str) -> Result<Vec<String>, ExecError> {
        let builtins = Builtins::new();
        let value = JsonValue::from_json_text(input).expect("bad test input");
        let mut outputs = Vec::new();
        builtins.call(name, &value, &mut outputs)?;
        Ok(outputs.iter().map(JsonValue::to_json).collect())
    }

    fn call_ok(name: &str, input: &str) -> Vec<String> {
        call(name, input).expect("builtin failed")
    }

    #[test]
    fn test_keys_object_sorted() {
        assert_eq!(call_ok("keys", r#"{"b":1,"a":2,"c":3}"#), vec![r#"["a","b","c"]"#]);
    }

    #[test]
    fn test_keys_array_indices() {
        assert_eq!(call_ok("keys", "[10,20,30]"), vec!["[0,1,2]"]);
        assert_eq!(call_ok("keys", "[]"), vec!["[]"]);
    }

    #[test]
    fn test_keys_scalar_errors() {
        assert!(call("keys", "42").is_err());
        assert!(call("keys", "null").is_err());
    }

    #[test]
    fn test_values() {
        assert_eq!(call_ok("values", r#"{"b":2,"a":1}"#), vec!["1", "2"]);
        assert_eq!(call_ok("values", "[1,2]"), vec!["1", "2"]);
        assert!(call("values", "\"s\"").is_err());
    }

    #[test]
    fn test_type() {
        assert_eq!(call_ok("type", "null"), vec!["\"null\""]);
        assert_eq!(call_ok("type", "true"), vec!["\"boolean\""]);
        assert_eq!(call_ok("type", "1.5"), vec!["\"number\""]);
        assert_eq!(call_ok("type", "\"s\""), vec!["\"string\""]);
        assert_eq!(call_ok("type", "[1,2]"), vec!["\"array\""]);
        assert_eq!(call_ok("type", "{}"), vec!["\"object\""]);
    }

    #[test]
    fn test_length() {
        // Byte length for strings: "héllo" is six bytes.
        assert_eq!(call_ok("length", r#""héllo""#), vec!["6"]);
        assert_eq!(call_ok("length", "[1,2,3]"), vec!["3"]);
        assert_eq!(call_ok("length", r#"{"a":1,"b":2}"#), vec!["2"]);
        assert_eq!(call_ok("length", "null"), vec!["0"]);
        assert_eq!(call_ok("length", "true"), vec!["0"]);
        assert_eq!(call_ok("length", "3.5"), vec!["0"]);
    }

    #[test]
    fn test_empty() {
        assert_eq!(call_ok("empty", "[1,2,3]"), Vec::<String>::new());
        assert_eq!(call_ok("empty", "null"), Vec::<String>::new());
    }

    #[test]
    fn test_reverse() {
        assert_eq!(call_ok("reverse", "[1,2,3]"), vec!["[3,2,1]"]);
        assert_eq!(call_ok("reverse", "\"abc\""), vec!["\"cba\""]);
        assert!(call("reverse", "42").is_err());
    }

    #[test]
    fn test_sort_numbers_and_strings() {
        assert_eq!(call_ok("sort", "[3,1,2]"), vec!["[1,2,3]"]);
        assert_eq!(call_ok("sort", r#"["b","a","c"]"#), vec![r#"["a","b","c"]"#]);
    }

    #[test]
    fn test_sort_mixed_types_by_rank() {
        assert_eq!(
            call_ok("sort", r#"["s",true,2,null,[1],{}]"#),
            vec![r#"[null,true,2,"s",[1],{}]"#]
        );
    }

    #[test]
    fn test_sort_non_array_errors() {
        let err = call("sort", r#"{"a":1}"#).unwrap_err();
        assert!(err.message.contains("sort"));
    }

    #[test]
    fn test_to_entries() {
        assert_eq!(
            call_ok("to_entries", r#"{"b":2,"a":1}"#),
            vec![r#"[{"key":"a","value":1},{"key":"b","value":2}]"#]
        );
        assert!(call("to_entries", "[1]").is_err());
    }

    #[test]
    fn test_unknown_builtin() {
        let err = call("frobnicate", "{}").unwrap_err();
        assert!(err.message.contains("unknown builtin: frobnicate"));
    }

    #[test]
    fn test_register_replaces() {
        fn always_one(_: &JsonValue, outputs: &mut Vec<JsonValue>) -> Result<(), ExecError> {
            outputs.push(JsonValue::number(1.0));
            Ok(())
        }

        let mut builtins = Builtins::new();
        assert!(builtins.contains("type"));
        builtins.register("type", always_one);

        let mut outputs = Vec::new();
        builtins.call("type", &JsonValue::Null, &mut outputs).unwrap();
        assert_eq!(outputs, vec![JsonValue::number(1.0)]);
    }
}
