use reqwest::StatusCode;
use thiserror::Error;

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Durable session storage failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid storage key '{0}': keys must be lowercase alphanumeric, '-' or '_'")]
    InvalidKey(String),

    #[error("failed to read '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove '{key}': {source}")]
    Remove {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failures surfaced by the API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend rejected the credential. By the time a caller observes
    /// this, the guard has already torn the session down.
    #[error("session expired or invalid, sign in again")]
    Unauthorized,

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A non-401 failure status with the backend's `{detail}` message.
    #[error("server returned {status}: {detail}")]
    Api { status: StatusCode, detail: String },

    #[error("unexpected response from server: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid request target: {0}")]
    Url(#[from] url::ParseError),
}
