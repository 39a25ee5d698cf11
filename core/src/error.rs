//! Error types for the todo API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the resource does not exist" from "the server returned an unexpected
//! status". A second delete of the same id, for example, surfaces `NotFound`
//! and the caller may treat it as already satisfied. All other non-2xx
//! responses land in `ServerError` with the raw status code and body.
//! `ValidationError` is produced before any request is built.

use thiserror::Error;

/// Errors returned by the service facade and the state container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No response was received (connection refused, DNS, I/O).
    #[error("network error: {0}")]
    NetworkError(String),

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    ServerError { status: u16, body: String },

    /// The server returned 404: the requested record does not exist.
    #[error("resource not found")]
    NotFound,

    /// The input was rejected locally; no request was sent.
    #[error("invalid input: {0}")]
    ValidationError(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}

impl ApiError {
    /// One short phrase per failure kind, used for the user-facing notice.
    pub fn summary(&self) -> String {
        match self {
            ApiError::NetworkError(_) => "server unreachable".to_string(),
            ApiError::ServerError { status, .. } => format!("server responded with {status}"),
            ApiError::NotFound => "record no longer exists".to_string(),
            ApiError::ValidationError(msg) => msg.clone(),
            ApiError::DeserializationError(_) => "unexpected response from server".to_string(),
            ApiError::SerializationError(_) => "request could not be encoded".to_string(),
        }
    }
}

/// Errors raised while reading client configuration from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}
