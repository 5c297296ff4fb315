use serde::{Deserialize, Serialize};

/// HTTP-like verb for a logical request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical network request, described as plain data.
///
/// Commands are built by the controller and executed by the command runner;
/// the protocol layer never performs I/O.
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub session_token: Option<String>,
}

impl Command {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
            session_token: None,
        }
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
            session_token: None,
        }
    }

    pub fn put(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Put,
            path: path.into(),
            body: Some(body),
            session_token: None,
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            path: path.into(),
            body: None,
            session_token: None,
        }
    }

    pub fn with_session_token(mut self, session_token: Option<String>) -> Self {
        self.session_token = session_token;
        self
    }
}

/// Decoded outcome of one executed command: raw status plus decoded JSON body.
///
/// Non-2xx statuses are carried here rather than surfaced as runner errors,
/// leaving success-vs-error interpretation to the controller.
#[derive(Clone, Debug)]
pub struct CommandResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl CommandResponse {
    pub fn new(status: u16, body: serde_json::Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
