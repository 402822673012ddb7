//! Helpers for building data values.

use serde::Serialize;
use tera::Value;

use crate::pipeline::DataMap;

/// Convert any keyed collection of serializable values into a [`DataMap`],
/// ready for [`Pipeline::set_data`](crate::Pipeline::set_data) or for use as a
/// repeated-render mapping.
pub fn to_data_map<I, K, T>(entries: I) -> Result<DataMap, serde_json::Error>
where
    I: IntoIterator<Item = (K, T)>,
    K: Into<String>,
    T: Serialize,
{
    entries
        .into_iter()
        .map(|(k, v)| serde_json::to_value(v).map(|v| (k.into(), v)))
        .collect()
}

/// Short name of a value's kind, for log messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
