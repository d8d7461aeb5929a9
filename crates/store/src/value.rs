//! Lenient accessors over untyped JSON records.
//!
//! Missing or mis-typed fields resolve to the type's empty value (`""`,
//! `false`, `None`, `null`) instead of failing. Structural failures are
//! reported by the shape layer, not here.

use serde_json::{Map, Value};

/// One JSON object, either a source element or a flattened view record.
pub type Record = Map<String, Value>;

pub fn str_field<'a>(record: &'a Record, field: &str) -> &'a str {
    opt_str_field(record, field).unwrap_or("")
}

pub fn opt_str_field<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}

pub fn bool_field(record: &Record, field: &str) -> bool {
    record.get(field).and_then(Value::as_bool).unwrap_or(false)
}

pub fn object_field<'a>(record: &'a Record, field: &str) -> Option<&'a Record> {
    record.get(field).and_then(Value::as_object)
}

/// Copies a field verbatim; an absent field becomes `null`.
pub fn field_or_null(record: &Record, field: &str) -> Value {
    record.get(field).cloned().unwrap_or(Value::Null)
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn key_list(record: &Record) -> String {
    record.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn eq_ignore_case(left: &str, right: &str) -> bool {
    left.to_lowercase() == right.to_lowercase()
}
