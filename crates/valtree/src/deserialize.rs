//! Populating typed values from any traversal.
//!
//! [`DeserializingBuilder`] is an [`ObjectBuilder`] that assembles the
//! path-keyed values it receives into a `serde_json::Value` and hands that
//! to serde when the traversal finishes.

use crate::builder::ObjectBuilder;
use crate::path::TreePath;
use crate::values::Values;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::marker::PhantomData;

pub struct DeserializingBuilder<T> {
    document: Value,
    result: Option<T>,
    _target: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Default for DeserializingBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> DeserializingBuilder<T> {
    pub fn new() -> Self {
        DeserializingBuilder {
            document: Value::Null,
            result: None,
            _target: PhantomData,
        }
    }

    /// The document assembled so far.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// The deserialized value, if the traversal finished successfully.
    pub fn into_value(self) -> Option<T> {
        self.result
    }

    fn slot(&mut self, path: &TreePath) -> Option<&mut Value> {
        let mut current = &mut self.document;
        for segment in path.iter() {
            if current.is_null() {
                *current = Value::Object(Map::new());
            }
            current = match current {
                Value::Object(members) => members.entry(segment).or_insert(Value::Null),
                Value::Array(items) => {
                    let index: usize = segment.parse().ok()?;
                    if index == items.len() {
                        items.push(Value::Null);
                    }
                    items.get_mut(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    fn slot_or_log(&mut self, path: &TreePath) -> Option<&mut Value> {
        let slot = self.slot(path);
        if slot.is_none() {
            tracing::debug!(path = %path, "value path conflicts with the built document");
        }
        slot
    }
}

fn json_values(values: Values<'_>) -> Vec<Value> {
    match values {
        Values::Nil(count) => vec![Value::Null; count],
        Values::Bool(items) => items.iter().copied().map(Value::from).collect(),
        Values::Int(items) => items.iter().copied().map(Value::from).collect(),
        Values::UInt(items) => items.iter().copied().map(Value::from).collect(),
        Values::Float(items) => items.iter().copied().map(Value::from).collect(),
        Values::Double(items) => items.iter().copied().map(Value::from).collect(),
        Values::Str(items) => items.iter().copied().map(Value::from).collect(),
    }
}

impl<T: DeserializeOwned> ObjectBuilder for DeserializingBuilder<T> {
    fn begin(&mut self) {
        self.document = Value::Null;
        self.result = None;
    }

    fn add(&mut self, path: &TreePath, values: Values<'_>) {
        let Some(slot) = self.slot_or_log(path) else {
            return;
        };
        let mut items = json_values(values);
        match slot {
            Value::Array(existing) => existing.append(&mut items),
            _ if items.len() == 1 => *slot = items.remove(0),
            _ => *slot = Value::Array(items),
        }
    }

    fn add_object(&mut self, path: &TreePath) {
        if let Some(slot) = self.slot_or_log(path)
            && !slot.is_object()
        {
            *slot = Value::Object(Map::new());
        }
    }

    fn add_list(&mut self, path: &TreePath) {
        if let Some(slot) = self.slot_or_log(path) {
            *slot = Value::Array(Vec::new());
        }
    }

    fn finish(&mut self) -> bool {
        match serde_json::from_value(self.document.clone()) {
            Ok(value) => {
                self.result = Some(value);
                true
            }
            Err(error) => {
                tracing::error!(%error, "cannot deserialize value tree");
                false
            }
        }
    }

    fn failed(&mut self) {
        tracing::debug!("traversal failed, nothing deserialized");
        self.result = None;
    }
}
