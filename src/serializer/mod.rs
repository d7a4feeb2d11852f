//! Database values → JSON.
//!
//! # Rules (applied recursively)
//! ```text
//! Null                     → null
//! Integer within ±(2^53-1) → number
//! Integer beyond that      → decimal string (never a lossy float)
//! List                     → array, order preserved
//! Node / Relationship      → their properties map only
//! Path                     → { start, end, segments: [{start, relationship, end}], length }
//! Temporal / Point         → map of components
//! Map                      → object, keys preserved
//! Scalars                  → unchanged
//! ```
//!
//! Entity identity, labels and relationship types are intentionally dropped.
//! `serialize` is total: unknown structures become an array of their fields.

mod temporal;

use serde_json::{Map, Number, Value};

use crate::bolt::{BoltMap, BoltValue, Path};

/// Largest integer a JSON (IEEE-754 double) number represents exactly.
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

/// Convert a database value into a JSON-safe value.
pub fn serialize(value: &BoltValue) -> Value {
    match value {
        BoltValue::Null => Value::Null,
        BoltValue::Boolean(b) => Value::Bool(*b),
        BoltValue::Integer(i) => integer(*i),
        BoltValue::Float(f) => float(*f),
        BoltValue::String(s) => Value::String(s.clone()),
        BoltValue::Bytes(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
        BoltValue::List(items) => Value::Array(items.iter().map(serialize).collect()),
        BoltValue::Map(map) => properties(map),
        BoltValue::Node(node) => properties(&node.properties),
        BoltValue::Relationship(rel) => properties(&rel.properties),
        BoltValue::Path(path) => serialize_path(path),
        BoltValue::Date(_)
        | BoltValue::Time { .. }
        | BoltValue::LocalTime(_)
        | BoltValue::DateTime { .. }
        | BoltValue::LocalDateTime(_)
        | BoltValue::Duration { .. }
        | BoltValue::Point { .. } => temporal::components(value),
        BoltValue::Structure { fields, .. } => Value::Array(fields.iter().map(serialize).collect()),
    }
}

/// Apply the integer policy to a value that is already JSON.
///
/// The identity on anything `serialize` produces, so
/// `normalize(&serialize(v)) == serialize(v)`.
pub fn normalize(value: &Value) -> Value {
    match value {
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => integer(i),
            (None, Some(u)) => Value::String(u.to_string()),
            (None, None) => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), normalize(v)))
                .collect(),
        ),
        Value::Null | Value::Bool(_) | Value::String(_) => value.clone(),
    }
}

pub(crate) fn integer(i: i64) -> Value {
    if (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&i) {
        Value::from(i)
    } else {
        Value::String(i.to_string())
    }
}

/// Non-finite floats have no JSON form and become null.
pub(crate) fn float(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

fn properties(map: &BoltMap) -> Value {
    let mut out = Map::with_capacity(map.len());
    for (key, value) in map {
        out.insert(key.clone(), serialize(value));
    }
    Value::Object(out)
}

fn serialize_path(path: &Path) -> Value {
    let segments: Vec<Value> = path
        .segments
        .iter()
        .map(|segment| {
            let mut out = Map::new();
            out.insert("start".into(), properties(&segment.start.properties));
            out.insert(
                "relationship".into(),
                properties(&segment.relationship.properties),
            );
            out.insert("end".into(), properties(&segment.end.properties));
            Value::Object(out)
        })
        .collect();

    let mut out = Map::new();
    out.insert("start".into(), properties(&path.start.properties));
    out.insert("end".into(), properties(&path.end().properties));
    out.insert("length".into(), Value::from(segments.len()));
    out.insert("segments".into(), Value::Array(segments));
    Value::Object(out)
}
