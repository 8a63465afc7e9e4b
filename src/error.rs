//! Error types for Podio API operations.

use thiserror::Error;

/// Errors that can occur during Podio API operations.
#[derive(Debug, Error)]
pub enum PodioError {
    /// Neither a refresh token nor a username/password pair is available.
    #[error("Insufficient credentials: {0}")]
    Credentials(String),

    /// The token endpoint rejected the credentials.
    #[error("Authentication failed: {message}")]
    Authentication {
        message: String,
        status_code: Option<u16>,
    },

    /// A non-auth endpoint answered with a non-2xx status.
    #[error("Podio API error ({status_code}): {message}")]
    Api { status_code: u16, message: String },

    /// A caller-supplied argument failed a local check; no request was sent.
    #[error("Invalid argument: {0}")]
    Validation(String),

    /// The operation is not implemented for the given input.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// A JSON object lacks the field that identifies the entity.
    #[error("{entity} is missing required field '{field}'")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },

    /// The response body did not have the expected JSON shape.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The session was closed by the caller.
    #[error("Session is closed")]
    SessionClosed,

    /// Configuration is missing or incomplete.
    #[error("Podio configuration required: {0}")]
    ConfigMissing(String),

    /// The request timed out in the transport.
    #[error("Request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Local I/O error (reading an upload from disk).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PodioError {
    /// Classify a transport failure, keeping timeouts distinct.
    pub(crate) fn transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else {
            Self::Http(err)
        }
    }

    /// The HTTP status code associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status_code, .. } => Some(*status_code),
            Self::Authentication { status_code, .. } => *status_code,
            Self::Http(e) | Self::Timeout(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the remote reported that the referenced resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status_code: 404, .. })
    }
}

/// Result type alias for Podio operations.
pub type Result<T> = core::result::Result<T, PodioError>;
