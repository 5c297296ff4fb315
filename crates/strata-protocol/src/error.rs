use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("malformed batch response: {0}")]
    MalformedBatchResponse(String),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
