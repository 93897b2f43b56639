//! Errors related to interacting with the ECS API

/// Errors returned by [`Client`](crate::Client) calls.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request never produced a response (connection, TLS, timeout...)
    #[error("ECS request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The API answered with a non-success status.
    ///
    /// The body is kept verbatim so callers can decode it into a
    /// [`ServiceResponseError`] and branch on the error code.
    #[error("ECS API returned {status}: {body}")]
    Api {
        /// HTTP status of the response
        status: u16,
        /// Raw response body
        body: String,
    },
    /// A success response could not be parsed.
    #[error("failed to decode ECS response from {url}: {source}")]
    Decode {
        /// The request URL
        url: String,
        /// The parse failure
        source: serde_json::Error,
    },
    /// The request URL could not be built from the configured endpoint.
    #[error("invalid ECS URL: {0}")]
    Url(#[from] url::ParseError),
    /// The client configuration is unusable.
    #[error("invalid ECS client configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Decode the body of an [`Error::Api`] into the service error envelope.
    ///
    /// Returns `None` for every other variant and for bodies that are not a
    /// recognised envelope.
    pub fn service_error(&self) -> Option<ServiceResponseError> {
        match self {
            Error::Api { status, body } => {
                let mut err = ServiceResponseError::from_body(body)?;
                err.status_code = *status;
                Some(err)
            }
            _ => None,
        }
    }
}

/// The error format the ECS API reports in non-success responses.
///
/// Error codes are documented at
/// https://support.huaweicloud.com/en-us/api-ecs/ecs_07_0002.html
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceResponseError {
    /// HTTP status of the response carrying the error
    pub status_code: u16,
    /// The request ID assigned by the API gateway, if reported
    pub request_id: String,
    /// The machine readable error code, e.g. `Ecs.0114`
    pub error_code: String,
    /// The human readable message
    pub error_message: String,
}

impl ServiceResponseError {
    /// Parse a raw response body.
    ///
    /// Both the flat envelope (`{"error_code": .., "error_msg": ..}`) and the
    /// nested one (`{"error": {"code": .., "message": ..}}`) are accepted. A
    /// body that matches neither, or that carries an empty code, yields `None`.
    pub fn from_body(body: &str) -> Option<Self> {
        let envelope = match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!("unrecognised ECS error body: {}", e);
                return None;
            }
        };
        let err = match envelope {
            ErrorEnvelope::Flat {
                error_code,
                error_msg,
                request_id,
            } => ServiceResponseError {
                status_code: 0,
                request_id,
                error_code,
                error_message: error_msg,
            },
            ErrorEnvelope::Nested { error } => ServiceResponseError {
                status_code: 0,
                request_id: String::new(),
                error_code: error.code,
                error_message: error.message,
            },
        };
        if err.error_code.is_empty() {
            return None;
        }
        Some(err)
    }
}

impl std::fmt::Display for ServiceResponseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ECS API error {} ({}): {}",
            self.error_code, self.status_code, self.error_message
        )
    }
}

impl std::error::Error for ServiceResponseError {}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum ErrorEnvelope {
    Flat {
        error_code: String,
        #[serde(default, alias = "error_message")]
        error_msg: String,
        #[serde(default)]
        request_id: String,
    },
    Nested {
        error: NestedError,
    },
}

#[derive(serde::Deserialize)]
struct NestedError {
    code: String,
    #[serde(default)]
    message: String,
}
