use std::fmt;

use http::{HeaderMap, StatusCode};

use crate::decode::RawFields;

/// Client-specific result type
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors from the Text to Speech client
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Options record failed validation before any I/O
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// Base URL or path template could not be resolved
    #[error("failed to resolve request URL: {0}")]
    PathResolution(String),

    /// Connection, timeout or other transport failure
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Service answered with a non-2xx status
    #[error(transparent)]
    HttpStatus(Box<HttpStatusError>),

    /// Response body did not match the expected shape
    #[error("failed to decode response at `{path}`: {message}")]
    Decode {
        /// Field path of the offending value (`.` for the document root)
        path: String,
        /// Underlying parser message
        message: String,
    },

    /// Credentials could not be attached to the request
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Caller cancelled the in-flight request
    #[error("request cancelled")]
    Cancelled,

    /// Invalid client configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether a retry of the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_connect() || e.is_timeout(),
            Self::HttpStatus(e) => is_retryable_status(e.status),
            _ => false,
        }
    }

    /// HTTP status carried by the error, if the service answered
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::HttpStatus(e) => Some(e.status),
            Self::Network(e) => e.status(),
            _ => None,
        }
    }
}

impl From<HttpStatusError> for Error {
    fn from(err: HttpStatusError) -> Self {
        Self::HttpStatus(Box::new(err))
    }
}

/// 429 and 5xx are transient, except 501 which never changes on retry
pub(crate) fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || (status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED)
}

/// Missing or malformed fields on an options record
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required field was never set
    #[error("missing required field `{0}`")]
    MissingRequiredField(&'static str),

    /// A required, non-blank field was set to an empty string
    #[error("required field `{0}` must not be empty")]
    EmptyRequiredField(&'static str),

    /// A field holds a value the service would reject
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Offending field
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

/// Non-2xx response from the service
#[derive(Debug)]
pub struct HttpStatusError {
    /// HTTP status code
    pub status: StatusCode,
    /// Human-readable message extracted from the body, or the reason phrase
    pub message: String,
    /// Decoded JSON error body, when the body was a JSON object
    pub body: Option<RawFields>,
    /// Response headers
    pub headers: HeaderMap,
}

impl HttpStatusError {
    pub(crate) fn new(status: StatusCode, headers: HeaderMap, body: &[u8]) -> Self {
        let fields = crate::decode::parse_fields(body).ok();
        let message = fields
            .as_ref()
            .and_then(error_message)
            .or_else(|| {
                let text = String::from_utf8_lossy(body).trim().to_owned();
                (!text.is_empty() && fields.is_none() && text.len() <= 512).then_some(text)
            })
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_owned());

        Self {
            status,
            message,
            body: fields,
            headers,
        }
    }
}

impl fmt::Display for HttpStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}: {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for HttpStatusError {}

/// Pull a message out of the error body shapes the service is known to use
fn error_message(fields: &RawFields) -> Option<String> {
    for key in ["error", "message", "errorMessage"] {
        if let Some(message) = fields.get(key).and_then(serde_json::Value::as_str) {
            return Some(message.to_owned());
        }
    }

    fields
        .get("errors")
        .and_then(|errors| errors.get(0))
        .and_then(|first| first.get("message"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
}
