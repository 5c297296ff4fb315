//! Pending field mutations.
//!
//! The persistence core never interprets an operation beyond asking it to
//! encode itself into a wire value, so the contract is a single-method
//! object-safe trait. The concrete operations here cover the store's standard
//! `__op` vocabulary; anything else can be supplied by implementing the trait.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use serde_json::Map;

use crate::value::Value;

/// An opaque, self-encoding pending mutation to one field.
pub trait FieldOperation: Debug + Send + Sync {
    /// Encode into the wire value sent inside a save body.
    fn encode(&self) -> Value;
}

/// Overwrite the field with a value.
#[derive(Clone, Debug)]
pub struct Set(pub Value);

impl FieldOperation for Set {
    fn encode(&self) -> Value {
        self.0.clone()
    }
}

/// Atomically add to a numeric field. The amount may be integral or
/// fractional.
#[derive(Clone, Debug)]
pub struct Increment(pub Value);

impl Increment {
    pub fn by(amount: impl Into<Value>) -> Self {
        Self(amount.into())
    }
}

impl FieldOperation for Increment {
    fn encode(&self) -> Value {
        op_map("Increment", [("amount", self.0.clone())])
    }
}

/// Remove the field from the object entirely.
#[derive(Clone, Copy, Debug)]
pub struct DeleteField;

impl FieldOperation for DeleteField {
    fn encode(&self) -> Value {
        op_map("Delete", [])
    }
}

/// Append values to an array field.
#[derive(Clone, Debug)]
pub struct Add(pub Vec<Value>);

impl FieldOperation for Add {
    fn encode(&self) -> Value {
        op_map("Add", [("objects", Value::Array(self.0.clone()))])
    }
}

/// Remove values from an array field.
#[derive(Clone, Debug)]
pub struct Remove(pub Vec<Value>);

impl FieldOperation for Remove {
    fn encode(&self) -> Value {
        op_map("Remove", [("objects", Value::Array(self.0.clone()))])
    }
}

fn op_map<const N: usize>(op: &str, extra: [(&str, Value); N]) -> Value {
    let mut map = BTreeMap::new();
    map.insert("__op".to_string(), Value::String(op.into()));
    for (key, value) in extra {
        map.insert(key.to_string(), value);
    }
    Value::Object(map)
}

/// Ordered field-name → pending-operation map for one object.
///
/// Discarded after the save that carries it completes; operations never fold
/// into the resulting [`ObjectState`](crate::ObjectState).
#[derive(Clone, Debug, Default)]
pub struct FieldOperationSet {
    operations: BTreeMap<String, Arc<dyn FieldOperation>>,
}

impl FieldOperationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, operation: impl FieldOperation + 'static) {
        self.operations.insert(field.into(), Arc::new(operation));
    }

    /// Shorthand for the common case of setting a field to a value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.insert(field, Set(value.into()));
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn FieldOperation>)> {
        self.operations.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Encode the full set into a JSON save body.
    pub fn encode_body(&self) -> serde_json::Value {
        let mut body = Map::with_capacity(self.operations.len());
        for (field, operation) in &self.operations {
            body.insert(field.clone(), operation.encode().to_json());
        }
        serde_json::Value::Object(body)
    }
}
