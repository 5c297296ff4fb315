//! Wire protocol for the Strata object store SDK.
//!
//! Defines the logical command model, REST endpoint paths, and the batch
//! request/response envelopes exchanged between the SDK and the store.

pub mod batch;
pub mod command;
pub mod endpoint;
pub mod error;
pub mod error_codes;

pub use batch::{BatchEntry, BatchError, BatchRequest, BatchResponse, SubRequest, MAX_BATCH_SIZE};
pub use command::{Command, CommandResponse, Method};
pub use endpoint::endpoints;
pub use error::{ProtocolError, ProtocolResult};
