//! Numeric error codes returned by the store in `{code, error}` payloads.

/// Catch-all for errors with no better classification.
pub const OTHER_CAUSE: i32 = -1;
pub const INTERNAL_SERVER_ERROR: i32 = 1;
pub const CONNECTION_FAILED: i32 = 100;
pub const OBJECT_NOT_FOUND: i32 = 101;
pub const INVALID_QUERY: i32 = 102;
pub const INVALID_CLASS_NAME: i32 = 103;
pub const MISSING_OBJECT_ID: i32 = 104;
pub const INVALID_KEY_NAME: i32 = 105;
pub const INVALID_POINTER: i32 = 106;
pub const INVALID_JSON: i32 = 107;
pub const COMMAND_UNAVAILABLE: i32 = 108;
pub const INCORRECT_TYPE: i32 = 111;
pub const OBJECT_TOO_LARGE: i32 = 116;
pub const OPERATION_FORBIDDEN: i32 = 119;
pub const DUPLICATE_VALUE: i32 = 137;
pub const REQUEST_LIMIT_EXCEEDED: i32 = 155;
pub const INVALID_SESSION_TOKEN: i32 = 209;
