use thiserror::Error;

use strata_protocol::{error_codes, CommandResponse, ProtocolError};
use strata_types::TypeError;

/// Errors surfaced to SDK callers, one per completion handle.
///
/// Clonable so a chunk-level failure can resolve every handle in the chunk.
#[derive(Clone, Debug, Error)]
pub enum ClientError {
    /// The server returned a structured `{code, error}` payload.
    #[error("server error {code}: {message}")]
    Remote { code: i32, message: String },

    /// A local precondition was broken; a programming error, not a network one.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The server answered a batch with the wrong number of result entries.
    #[error("inconsistent batch response: sent {expected} requests, got {actual} results")]
    InconsistentBatch { expected: usize, actual: usize },

    /// The command runner could not complete the round trip.
    #[error("transport error: {0}")]
    Transport(String),

    /// A response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The operation was cancelled before completing.
    #[error("operation cancelled")]
    Cancelled,
}

impl From<TypeError> for ClientError {
    fn from(e: TypeError) -> Self {
        Self::Decode(e.to_string())
    }
}

impl From<ProtocolError> for ClientError {
    fn from(e: ProtocolError) -> Self {
        Self::Decode(e.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Map a non-success response onto the remote error it carries. Bodies
/// without a structured payload fall back to the catch-all code.
pub(crate) fn remote_from_response(response: &CommandResponse) -> ClientError {
    let code = response
        .body
        .get("code")
        .and_then(|v| v.as_i64())
        .map(|c| c as i32)
        .unwrap_or(error_codes::OTHER_CAUSE);
    let message = response
        .body
        .get("error")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("request failed with status {}", response.status));
    ClientError::Remote { code, message }
}
