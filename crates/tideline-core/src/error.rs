use std::fmt;

use serde_json::Value;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The request never produced an HTTP response (DNS, connect, TLS, timeout).
#[derive(Debug, Error)]
#[error("transport failure: {message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// Whatever the server sent back with a failing status.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    Json(Value),
    Text(String),
}

impl ErrorBody {
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => ErrorBody::Json(value),
            Err(_) => ErrorBody::Text(raw.to_string()),
        }
    }

    /// `message` field of a JSON error body, if the backend sent one.
    pub fn message(&self) -> Option<String> {
        match self {
            ErrorBody::Json(value) => match value.get("message") {
                Some(Value::String(message)) => Some(message.clone()),
                Some(Value::Array(items)) => Some(
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join("; "),
                ),
                _ => None,
            },
            ErrorBody::Text(_) => None,
        }
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorBody::Json(value) => write!(f, "{value}"),
            ErrorBody::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// 401 from the backend. The token is already cleared; do not retry.
    #[error("session expired, log in again")]
    SessionExpired,

    #[error("API error: {status} {status_text} - {body}")]
    Status {
        status: u16,
        status_text: String,
        body: ErrorBody,
    },

    #[error("failed to decode response from {path}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode request body")]
    Encode(#[source] serde_json::Error),

    #[error("expected a response body from {path}")]
    MissingBody { path: String },
}

impl ApiError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
