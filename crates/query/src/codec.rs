//! Structural codec - conversion between clause values and the JSON-like
//! wire structure, plus the query-string encoding used for URL transport

use std::collections::BTreeMap;

use serde_json::{Map, Value as JsonValue};

use crate::error::{QueryError, QueryResult};
use crate::value::Value;

/// Two-way conversion between a clause value and its structural form.
///
/// `from_structure(&x.to_structure())` must reproduce `x` exactly. Absent
/// optional attributes are omitted from the structure rather than written as
/// `null`.
pub trait Structural: Sized {
    fn to_structure(&self) -> JsonValue;

    fn from_structure(value: &JsonValue) -> QueryResult<Self>;
}

pub(crate) type Object = Map<String, JsonValue>;

pub(crate) fn as_object<'a>(value: &'a JsonValue, context: &str) -> QueryResult<&'a Object> {
    value
        .as_object()
        .ok_or_else(|| QueryError::wrong_type(context, "a mapping", value))
}

pub(crate) fn required<'a>(obj: &'a Object, key: &str, context: &str) -> QueryResult<&'a JsonValue> {
    obj.get(key).ok_or_else(|| QueryError::missing_key(context, key))
}

pub(crate) fn required_str(obj: &Object, key: &str, context: &str) -> QueryResult<String> {
    let value = required(obj, key, context)?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| QueryError::wrong_type(context, "a string", value))
}

pub(crate) fn optional_str(obj: &Object, key: &str, context: &str) -> QueryResult<Option<String>> {
    match obj.get(key) {
        None => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(QueryError::wrong_type(context, "a string", other)),
    }
}

pub(crate) fn optional_bool(obj: &Object, key: &str, context: &str) -> QueryResult<Option<bool>> {
    match obj.get(key) {
        None => Ok(None),
        Some(JsonValue::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(QueryError::wrong_type(context, "a boolean", other)),
    }
}

pub(crate) fn optional_u64(obj: &Object, key: &str, context: &str) -> QueryResult<Option<u64>> {
    match obj.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .map(Some)
            .ok_or_else(|| QueryError::wrong_type(context, "a non-negative integer", value)),
    }
}

pub(crate) fn optional_i64(obj: &Object, key: &str, context: &str) -> QueryResult<Option<i64>> {
    match obj.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| QueryError::wrong_type(context, "an integer", value)),
    }
}

pub(crate) fn as_array<'a>(value: &'a JsonValue, context: &str) -> QueryResult<&'a Vec<JsonValue>> {
    value
        .as_array()
        .ok_or_else(|| QueryError::wrong_type(context, "a sequence", value))
}

pub(crate) fn string_list(value: &JsonValue, context: &str) -> QueryResult<Vec<String>> {
    as_array(value, context)?
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| QueryError::wrong_type(context, "a string", item))
        })
        .collect()
}

pub(crate) fn optional_string_list(
    obj: &Object,
    key: &str,
    context: &str,
) -> QueryResult<Option<Vec<String>>> {
    obj.get(key).map(|value| string_list(value, context)).transpose()
}

pub(crate) fn value_list(value: &JsonValue, context: &str) -> QueryResult<Vec<Value>> {
    Ok(as_array(value, context)?.iter().map(Value::from_json).collect())
}

pub(crate) fn list_of<T: Structural>(value: &JsonValue, context: &str) -> QueryResult<Vec<T>> {
    as_array(value, context)?.iter().map(T::from_structure).collect()
}

pub(crate) fn optional_list_of<T: Structural>(
    obj: &Object,
    key: &str,
    context: &str,
) -> QueryResult<Option<Vec<T>>> {
    obj.get(key).map(|value| list_of(value, context)).transpose()
}

pub(crate) fn optional_of<T: Structural>(obj: &Object, key: &str) -> QueryResult<Option<T>> {
    obj.get(key).map(T::from_structure).transpose()
}

pub(crate) fn list_to_structure<T: Structural>(items: &[T]) -> JsonValue {
    JsonValue::Array(items.iter().map(Structural::to_structure).collect())
}

pub(crate) fn strings_to_structure(items: &[String]) -> JsonValue {
    JsonValue::Array(items.iter().cloned().map(JsonValue::String).collect())
}

pub(crate) fn values_to_structure(items: &[Value]) -> JsonValue {
    JsonValue::Array(items.iter().map(Value::to_json).collect())
}

pub(crate) fn value_map(value: &JsonValue, context: &str) -> QueryResult<BTreeMap<String, Value>> {
    Ok(as_object(value, context)?
        .iter()
        .map(|(key, value)| (key.clone(), Value::from_json(value)))
        .collect())
}

pub(crate) fn value_map_to_structure(map: &BTreeMap<String, Value>) -> JsonValue {
    JsonValue::Object(
        map.iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect(),
    )
}

/// Render every top-level entry of a structure as a URL-safe query pair.
///
/// Scalars become their text form; mappings and sequences become their
/// component-encoded JSON text. Non-mapping structures yield no pairs.
pub fn encode_query_pairs(structure: &JsonValue) -> Vec<(String, String)> {
    match structure {
        JsonValue::Object(map) => map
            .iter()
            .map(|(key, value)| (key.clone(), encode_component(value)))
            .collect(),
        _ => Vec::new(),
    }
}

/// Join encoded pairs into a query string (no leading `?`)
pub fn join_query_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), value))
        .collect::<Vec<_>>()
        .join("&")
}

/// Encode a structure as a complete query string (no leading `?`)
pub fn to_query_string(structure: &JsonValue) -> String {
    join_query_pairs(&encode_query_pairs(structure))
}

/// Decode a query string produced by [`to_query_string`].
///
/// This is the receiver-side convention: each value is parsed as JSON and
/// falls back to plain text. A string value that looks like JSON (`"10"`,
/// `"true"`) therefore comes back as the corresponding scalar.
pub fn decode_query_string(query: &str) -> QueryResult<JsonValue> {
    let mut map = Map::new();
    for pair in query.trim_start_matches('?').split('&').filter(|p| !p.is_empty()) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_text(raw_key)?;
        let text = decode_text(raw_value)?;
        let value = serde_json::from_str::<JsonValue>(&text).unwrap_or(JsonValue::String(text));
        map.insert(key, value);
    }
    Ok(JsonValue::Object(map))
}

fn encode_component(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => urlencoding::encode(s).into_owned(),
        JsonValue::Null | JsonValue::Bool(_) | JsonValue::Number(_) => value.to_string(),
        JsonValue::Array(_) | JsonValue::Object(_) => urlencoding::encode(&value.to_string()).into_owned(),
    }
}

fn decode_text(text: &str) -> QueryResult<String> {
    urlencoding::decode(text)
        .map(|decoded| decoded.into_owned())
        .map_err(|err| QueryError::Format {
            value: text.to_string(),
            message: format!("invalid percent-encoding in query string: {}", err),
        })
}
