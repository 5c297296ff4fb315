//! Object persistence core for the Strata SDK.
//!
//! Translates local, possibly-partial object mutations into REST commands,
//! decodes responses into canonical object states, and batches many
//! simultaneous operations into as few network round trips as possible while
//! preserving per-object success/failure semantics and exact result order.
//!
//! The network itself lives behind the [`CommandRunner`] seam; this crate
//! never opens a connection.

pub mod batch;
pub mod cancel;
pub mod controller;
pub mod error;
pub mod runner;

pub use batch::CompletionHandle;
pub use cancel::{CancellationSource, CancellationToken};
pub use controller::{ObjectController, RequestOptions};
pub use error::{ClientError, ClientResult};
pub use runner::{CommandRunner, ProgressSink};

// Re-export the data model for convenience.
pub use strata_protocol::{Command, CommandResponse, Method, MAX_BATCH_SIZE};
pub use strata_types::{FieldOperationSet, ObjectState, ObjectStateBuilder, Value};
