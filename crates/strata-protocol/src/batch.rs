//! Batch wire envelopes.
//!
//! A batch command wraps up to [`MAX_BATCH_SIZE`] logical sub-requests in one
//! POST to the batch endpoint. The response carries one result entry per
//! sub-request, positionally: entry *i* answers request *i*.

use serde::{Deserialize, Serialize};

use crate::command::{Command, Method};
use crate::endpoint::endpoints;
use crate::error::{ProtocolError, ProtocolResult};

/// Maximum number of sub-requests per batch command.
pub const MAX_BATCH_SIZE: usize = 50;

/// Request envelope: `{"requests": [...]}`.
#[derive(Clone, Debug, Serialize)]
pub struct BatchRequest {
    pub requests: Vec<SubRequest>,
}

impl BatchRequest {
    pub fn new(requests: Vec<SubRequest>) -> Self {
        Self { requests }
    }

    /// Wrap the envelope into the batch POST command.
    pub fn into_command(self, session_token: Option<String>) -> ProtocolResult<Command> {
        let body = serde_json::to_value(&self)
            .map_err(|e| ProtocolError::Serialization(e.to_string()))?;
        Ok(Command::post(endpoints::BATCH, body).with_session_token(session_token))
    }
}

/// One logical request inside a batch envelope.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SubRequest {
    pub method: Method,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl SubRequest {
    /// Flatten a single-object command into its batch form. The session
    /// token stays on the enclosing batch command.
    pub fn from_command(command: &Command) -> Self {
        Self {
            method: command.method,
            path: command.path.clone(),
            body: command.body.clone(),
        }
    }
}

/// Response envelope: `{"results": [...]}`, same length and order as the
/// originating request list.
#[derive(Clone, Debug)]
pub struct BatchResponse {
    pub results: Vec<BatchEntry>,
}

impl BatchResponse {
    /// Decode a batch response body.
    ///
    /// Decoded by hand rather than derived: an entry is classified by which
    /// key it actually carries, so `{"error": ...}` can never be mistaken
    /// for a success with an absent payload.
    pub fn from_body(body: &serde_json::Value) -> ProtocolResult<Self> {
        let results = body
            .get("results")
            .and_then(|r| r.as_array())
            .ok_or_else(|| {
                ProtocolError::MalformedBatchResponse("missing results array".into())
            })?;
        Ok(Self {
            results: results
                .iter()
                .map(BatchEntry::from_json)
                .collect::<ProtocolResult<Vec<_>>>()?,
        })
    }
}

/// One per-item result: either a success payload (an object body, or `None`
/// for deletes) or a structured server error.
#[derive(Clone, Debug)]
pub enum BatchEntry {
    Success(Option<serde_json::Value>),
    Error(BatchError),
}

impl BatchEntry {
    fn from_json(json: &serde_json::Value) -> ProtocolResult<Self> {
        let map = json.as_object().ok_or_else(|| {
            ProtocolError::MalformedBatchResponse("result entry is not an object".into())
        })?;
        if let Some(error) = map.get("error") {
            let error: BatchError = serde_json::from_value(error.clone())
                .map_err(|e| ProtocolError::MalformedBatchResponse(e.to_string()))?;
            return Ok(Self::Error(error));
        }
        match map.get("success") {
            Some(success) if success.is_null() => Ok(Self::Success(None)),
            Some(success) => Ok(Self::Success(Some(success.clone()))),
            None => Err(ProtocolError::MalformedBatchResponse(
                "result entry has neither success nor error".into(),
            )),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct BatchError {
    pub code: i32,
    #[serde(rename = "error")]
    pub message: String,
}
