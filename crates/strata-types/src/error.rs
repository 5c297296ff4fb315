use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypeError {
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("invalid {tag} value: {reason}")]
    InvalidTaggedValue { tag: String, reason: String },

    #[error("expected a JSON object, got {0}")]
    NotAnObject(String),
}

pub type TypeResult<T> = Result<T, TypeError>;
