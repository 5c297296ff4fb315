//! Dynamically-typed field values.
//!
//! The store's wire format is JSON plus a small set of `__type`-tagged
//! extension kinds (dates, pointers to other objects). Rather than passing
//! `serde_json::Value` through the whole SDK, fields are modeled as a closed
//! sum type over exactly the kinds the wire format can carry.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Number};

use crate::error::{TypeError, TypeResult};

/// A single field value, covering every wire-safe kind.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    /// A `{"__type": "Date"}`-tagged timestamp.
    Date(DateTime<Utc>),
    /// A `{"__type": "Pointer"}`-tagged reference to another object.
    Pointer {
        class_name: String,
        object_id: String,
    },
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Date(_) => "date",
            Self::Pointer { .. } => "pointer",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Encode into the JSON wire representation.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Integer(n) => serde_json::Value::Number((*n).into()),
            Self::Float(n) => Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Self::Object(map) => {
                let mut out = Map::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k.clone(), v.to_json());
                }
                serde_json::Value::Object(out)
            }
            Self::Date(dt) => {
                let mut out = Map::with_capacity(2);
                out.insert("__type".into(), "Date".into());
                out.insert("iso".into(), encode_date(dt).into());
                serde_json::Value::Object(out)
            }
            Self::Pointer {
                class_name,
                object_id,
            } => {
                let mut out = Map::with_capacity(3);
                out.insert("__type".into(), "Pointer".into());
                out.insert("className".into(), class_name.clone().into());
                out.insert("objectId".into(), object_id.clone().into());
                serde_json::Value::Object(out)
            }
        }
    }

    /// Decode from the JSON wire representation.
    ///
    /// JSON objects carrying a recognized `__type` tag become the matching
    /// extension kind; an unrecognized tag is kept as a plain object.
    pub fn from_json(json: &serde_json::Value) -> TypeResult<Self> {
        Ok(match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::String(s.clone()),
            serde_json::Value::Array(items) => Self::Array(
                items
                    .iter()
                    .map(Value::from_json)
                    .collect::<TypeResult<Vec<_>>>()?,
            ),
            serde_json::Value::Object(map) => match map.get("__type").and_then(|t| t.as_str()) {
                Some("Date") => {
                    let iso = map.get("iso").and_then(|v| v.as_str()).ok_or_else(|| {
                        TypeError::InvalidTaggedValue {
                            tag: "Date".into(),
                            reason: "missing iso field".into(),
                        }
                    })?;
                    Self::Date(parse_date(iso)?)
                }
                Some("Pointer") => {
                    let class_name = map.get("className").and_then(|v| v.as_str()).ok_or_else(
                        || TypeError::InvalidTaggedValue {
                            tag: "Pointer".into(),
                            reason: "missing className field".into(),
                        },
                    )?;
                    let object_id = map.get("objectId").and_then(|v| v.as_str()).ok_or_else(
                        || TypeError::InvalidTaggedValue {
                            tag: "Pointer".into(),
                            reason: "missing objectId field".into(),
                        },
                    )?;
                    Self::Pointer {
                        class_name: class_name.into(),
                        object_id: object_id.into(),
                    }
                }
                _ => {
                    let mut out = BTreeMap::new();
                    for (k, v) in map {
                        out.insert(k.clone(), Value::from_json(v)?);
                    }
                    Self::Object(out)
                }
            },
        })
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Integer(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Parse an RFC 3339 timestamp as sent by the server.
pub fn parse_date(s: &str) -> TypeResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TypeError::InvalidTimestamp {
            value: s.into(),
            reason: e.to_string(),
        })
}

/// Format a timestamp the way the server expects: millisecond precision, Z suffix.
pub fn encode_date(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
