//! Canonical object state: immutable snapshots and their mutable drafts.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::{TypeError, TypeResult};
use crate::value::{parse_date, Value};

/// Metadata keys the server embeds in object bodies. These are always pulled
/// out into dedicated attributes and never appear in the field map.
pub const RESERVED_KEYS: [&str; 5] = ["__type", "className", "objectId", "createdAt", "updatedAt"];

/// Immutable snapshot of one remote object's last known truth.
///
/// States are never mutated in place: decoding a server response produces a
/// brand-new state, and local edits accumulate in an [`ObjectStateBuilder`].
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectState {
    class_name: String,
    object_id: Option<String>,
    fields: BTreeMap<String, Value>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    is_new: bool,
}

impl ObjectState {
    /// Start a mutable draft for the given class.
    pub fn builder(class_name: impl Into<String>) -> ObjectStateBuilder {
        ObjectStateBuilder::new(class_name)
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn object_id(&self) -> Option<&str> {
        self.object_id.as_deref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// True until the object has been created server-side.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains_key(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Decode a server response body into a complete replacement state.
    ///
    /// Every data field of the result comes from the response; nothing from
    /// `base`'s field map survives. The exceptions are identity metadata the
    /// server routinely omits on updates: class name, object id, and created
    /// timestamp carry forward from `base` when absent from the body.
    ///
    /// A body carrying `createdAt` but no `updatedAt` yields an updated
    /// timestamp equal to the created one (the server omits `updatedAt` on
    /// freshly created objects).
    pub fn from_response(body: &serde_json::Value, base: &ObjectState) -> TypeResult<ObjectState> {
        let map = body
            .as_object()
            .ok_or_else(|| TypeError::NotAnObject(json_kind(body).into()))?;

        let class_name = match map.get("className").and_then(|v| v.as_str()) {
            Some(name) => name.to_string(),
            None => base.class_name.clone(),
        };
        let object_id = map
            .get("objectId")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| base.object_id.clone());

        let body_created = match map.get("createdAt").and_then(|v| v.as_str()) {
            Some(s) => Some(parse_date(s)?),
            None => None,
        };
        let created_at = body_created.or(base.created_at);
        let updated_at = match map.get("updatedAt").and_then(|v| v.as_str()) {
            Some(s) => Some(parse_date(s)?),
            None => body_created,
        };

        let mut fields = BTreeMap::new();
        for (key, json) in map {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            fields.insert(key.clone(), Value::from_json(json)?);
        }

        Ok(ObjectState {
            class_name,
            is_new: object_id.is_none(),
            object_id,
            fields,
            created_at,
            updated_at,
        })
    }
}

/// Mutable draft form of an [`ObjectState`].
#[derive(Clone, Debug, Default)]
pub struct ObjectStateBuilder {
    class_name: String,
    object_id: Option<String>,
    fields: BTreeMap<String, Value>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl ObjectStateBuilder {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    pub fn with_object_id(mut self, object_id: impl Into<String>) -> Self {
        self.object_id = Some(object_id.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Freeze the draft. The snapshot counts as new while it has no id.
    pub fn build(self) -> ObjectState {
        ObjectState {
            class_name: self.class_name,
            is_new: self.object_id.is_none(),
            object_id: self.object_id,
            fields: self.fields,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
