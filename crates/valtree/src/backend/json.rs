//! Value trees over parsed JSON documents.
//!
//! Like the YAML backend, a node is the index path from the document root.
//! JSON values keep their native kinds, so numbers and booleans report
//! their own [`ValueKind`] and strings are converted only on request.
//! String fetches only accept JSON strings. Members of an object can also
//! be named by their index.
//! Byte fetches from a string decode it as base64.

use super::{Backend, make_compound};
use crate::compound::Compound;
use crate::convert::{FromText, duration_from_secs, parse_bool, parse_tribool};
use crate::error::Result;
use crate::kind::ValueKind;
use crate::values::{ValueSpan, copy_bytes, copy_chars, store};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::Value;
use std::time::Duration;

pub struct JsonBackend {
    document: Value,
}

impl JsonBackend {
    pub fn new(document: Value) -> Self {
        JsonBackend { document }
    }

    fn lookup(&self, node: &[usize]) -> Option<&Value> {
        node.iter()
            .try_fold(&self.document, |current, &index| entry_at(current, index).map(|(_, value)| value))
    }
}

fn entry_at(value: &Value, index: usize) -> Option<(Option<&str>, &Value)> {
    match value {
        Value::Array(items) => items.get(index).map(|item| (None, item)),
        Value::Object(members) => members
            .iter()
            .nth(index)
            .map(|(key, value)| (Some(key.as_str()), value)),
        _ => None,
    }
}

fn scalar_kind(value: &Value) -> ValueKind {
    match value {
        Value::Bool(_) => ValueKind::Bool,
        Value::Number(number) => {
            if let Some(value) = number.as_i64() {
                if i32::try_from(value).is_ok() {
                    ValueKind::Int32
                } else {
                    ValueKind::Int64
                }
            } else if number.is_u64() {
                ValueKind::Int64
            } else {
                ValueKind::Float
            }
        }
        Value::String(_) => ValueKind::String,
        Value::Null => ValueKind::Unknown,
        Value::Array(_) | Value::Object(_) => ValueKind::Composite,
    }
}

fn json_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(value) => Some(*value),
        Value::Number(number) => number.as_f64().map(|value| value != 0.0),
        Value::String(text) => parse_bool(text),
        _ => None,
    }
}

fn json_tribool(value: &Value) -> Option<Option<bool>> {
    match value {
        Value::Null => Some(None),
        Value::String(text) => parse_tribool(text),
        other => json_bool(other).map(Some),
    }
}

fn json_int<T>(value: &Value) -> Option<T>
where
    T: TryFrom<i64> + TryFrom<u64> + FromText,
{
    match value {
        Value::Number(number) => number
            .as_i64()
            .and_then(|value| <T as TryFrom<i64>>::try_from(value).ok())
            .or_else(|| {
                number
                    .as_u64()
                    .and_then(|value| <T as TryFrom<u64>>::try_from(value).ok())
            }),
        Value::String(text) => T::from_text(text),
        _ => None,
    }
}

fn json_float(value: &Value) -> Option<f32> {
    match value {
        Value::Number(number) => number.as_f64().map(|value| value as f32),
        Value::String(text) => f32::from_text(text),
        _ => None,
    }
}

fn json_duration(value: &Value) -> Option<Duration> {
    match value {
        Value::Number(number) => number.as_f64().and_then(duration_from_secs),
        Value::String(text) => Duration::from_text(text),
        _ => None,
    }
}

fn json_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        _ => None,
    }
}

fn set_json(dest: &mut ValueSpan<'_>, index: usize, value: &Value) -> bool {
    match dest {
        ValueSpan::Bool(slice) => store(&mut **slice, index, json_bool(value)),
        ValueSpan::Tribool(slice) => store(&mut **slice, index, json_tribool(value)),
        ValueSpan::Char(slice) => store(&mut **slice, index, value.as_str().and_then(char::from_text)),
        ValueSpan::Byte(slice) => store(&mut **slice, index, json_int(value)),
        ValueSpan::I16(slice) => store(&mut **slice, index, json_int(value)),
        ValueSpan::I32(slice) => store(&mut **slice, index, json_int(value)),
        ValueSpan::I64(slice) => store(&mut **slice, index, json_int(value)),
        ValueSpan::U16(slice) => store(&mut **slice, index, json_int(value)),
        ValueSpan::U32(slice) => store(&mut **slice, index, json_int(value)),
        ValueSpan::U64(slice) => store(&mut **slice, index, json_int(value)),
        ValueSpan::Float(slice) => store(&mut **slice, index, json_float(value)),
        ValueSpan::Duration(slice) => store(&mut **slice, index, json_duration(value)),
        ValueSpan::String(slice) => store(&mut **slice, index, json_string(value)),
    }
}

fn fill_from_json<'v>(dest: &mut ValueSpan<'_>, items: impl Iterator<Item = &'v Value>) -> usize {
    let mut written = 0;
    for item in items {
        if written >= dest.len() || !set_json(dest, written, item) {
            break;
        }
        written += 1;
    }
    written
}

impl Backend for JsonBackend {
    type Node = Vec<usize>;

    fn type_id(&self) -> &'static str {
        "json"
    }

    fn root(&self) -> Vec<usize> {
        Vec::new()
    }

    fn name(&self, node: &Vec<usize>) -> Option<String> {
        let (&last, parent) = node.split_last()?;
        let (key, _) = entry_at(self.lookup(parent)?, last)?;
        key.map(str::to_string)
    }

    fn preview(&self, node: &Vec<usize>) -> Option<String> {
        match self.lookup(node)? {
            Value::String(text) => Some(text.clone()),
            Value::Array(_) | Value::Object(_) => None,
            scalar => Some(scalar.to_string()),
        }
    }

    /// Arrays whose items all share one kind report that kind.
    fn canonical_type(&self, node: &Vec<usize>) -> ValueKind {
        match self.lookup(node) {
            Some(Value::Array(items)) => {
                let mut kinds = items.iter().map(scalar_kind);
                match kinds.next() {
                    Some(first) if first.is_scalar() && kinds.all(|kind| kind == first) => first,
                    _ => ValueKind::Composite,
                }
            }
            Some(value) => scalar_kind(value),
            None => ValueKind::Unknown,
        }
    }

    fn is_list(&self, node: &Vec<usize>) -> bool {
        matches!(self.lookup(node), Some(Value::Array(_)))
    }

    fn nested_count(&self, node: &Vec<usize>) -> usize {
        match self.lookup(node) {
            Some(Value::Array(items)) => items.len(),
            Some(Value::Object(members)) => members.len(),
            _ => 0,
        }
    }

    fn nested_at(&self, node: &Vec<usize>, index: usize) -> Option<Vec<usize>> {
        (index < self.nested_count(node)).then(|| {
            let mut child = node.clone();
            child.push(index);
            child
        })
    }

    fn nested_named(&self, node: &Vec<usize>, name: &str) -> Option<Vec<usize>> {
        let index = match self.lookup(node)? {
            Value::Object(members) => match members.keys().position(|key| key == name) {
                Some(index) => index,
                None => name.parse().ok()?,
            },
            Value::Array(_) => name.parse().ok()?,
            _ => return None,
        };
        self.nested_at(node, index)
    }

    fn value_count(&self, node: &Vec<usize>) -> usize {
        match self.lookup(node) {
            Some(Value::Array(items)) => items.len(),
            Some(Value::Null | Value::Object(_)) | None => 0,
            Some(_) => 1,
        }
    }

    fn fetch_values(&self, node: &Vec<usize>, offset: usize, mut dest: ValueSpan<'_>) -> usize {
        match self.lookup(node) {
            Some(Value::Array(items)) => fill_from_json(&mut dest, items.iter().skip(offset)),
            Some(value @ Value::String(text)) => match dest {
                ValueSpan::Char(chars) => copy_chars(text, offset, chars),
                ValueSpan::Byte(bytes) => match BASE64.decode(text) {
                    Ok(blob) => copy_bytes(&blob, offset, bytes),
                    Err(error) => {
                        tracing::debug!(%error, "string value is not base64");
                        0
                    }
                },
                mut other if offset == 0 => usize::from(set_json(&mut other, 0, value)),
                _ => 0,
            },
            Some(Value::Null | Value::Object(_)) | None => 0,
            Some(scalar) if offset == 0 => usize::from(set_json(&mut dest, 0, scalar)),
            Some(_) => 0,
        }
    }
}

/// Parse JSON text into a compound.
pub fn parse(text: &str) -> Result<Compound> {
    let document: Value = serde_json::from_str(text)?;
    Ok(make_compound(JsonBackend::new(document)))
}

/// Parse JSON text into a compound, logging parse errors and falling back
/// to the empty tree.
pub fn from_json_text(text: &str) -> Compound {
    parse(text).unwrap_or_else(|error| {
        tracing::error!(%error, "failed to parse JSON value tree");
        super::empty::empty()
    })
}
