//! Foundation types for the Strata object store SDK.
//!
//! This crate provides the data model shared by every other Strata crate:
//! immutable object snapshots, their mutable draft form, dynamically-typed
//! field values, and pending field operations.
//!
//! # Key Types
//!
//! - [`ObjectState`] - Immutable snapshot of one remote object's known truth
//! - [`ObjectStateBuilder`] - Mutable draft used to accumulate local edits
//! - [`Value`] - Closed sum type over the wire-safe field value kinds
//! - [`FieldOperation`] - Self-encoding pending mutation to one field
//! - [`FieldOperationSet`] - Ordered per-object map of pending operations

pub mod error;
pub mod operation;
pub mod state;
pub mod value;

pub use error::{TypeError, TypeResult};
pub use operation::{Add, DeleteField, FieldOperation, FieldOperationSet, Increment, Remove, Set};
pub use state::{ObjectState, ObjectStateBuilder, RESERVED_KEYS};
pub use value::Value;
