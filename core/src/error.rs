//! Error types for the REST client.
//!
//! # Design
//! Every failure a call can hit maps to exactly one variant, and each variant
//! carries what is needed to diagnose it without re-issuing the request: the
//! offending verb, the underlying cause, or the raw body the server sent.
//! There is no partial-success state; a call either decodes a result or
//! returns one of these.

use thiserror::Error;

/// Errors returned by `RestClient` calls and the pure building blocks
/// underneath it.
#[derive(Debug, Error)]
pub enum RestError {
    /// The verb is not one of GET, POST, PUT, DELETE. Raised before any I/O.
    #[error("HTTP method not supported: {0}")]
    UnsupportedMethod(String),

    /// The payload could not be serialized, or a multipart file could not be
    /// read. No request was sent.
    #[error("failed to encode request body: {reason}")]
    BodyEncoding {
        reason: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Connection, DNS, TLS or timeout failure inside the transport.
    #[error("transport error: {0}")]
    Transport(#[from] ureq::Error),

    /// The server answered outside the 2xx/3xx range. The body was read in
    /// full so server-side diagnostics survive.
    #[error("response is not successful (HTTP {status}): {body}")]
    UnsuccessfulResponse { status: u16, body: String },

    /// The body did not match the requested type.
    #[error("failed to deserialize response body: {source}")]
    Deserialization {
        #[source]
        source: serde_json::Error,
        body: String,
    },
}

/// Result type for REST operations.
pub type RestResult<T> = Result<T, RestError>;

impl RestError {
    pub(crate) fn encoding(
        reason: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RestError::BodyEncoding {
            reason: reason.into(),
            source: Box::new(source),
        }
    }

    /// HTTP status of an unsuccessful response, if that is what this is.
    pub fn status(&self) -> Option<u16> {
        match self {
            RestError::UnsuccessfulResponse { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response text attached to the error, when the server sent one.
    pub fn body(&self) -> Option<&str> {
        match self {
            RestError::UnsuccessfulResponse { body, .. } | RestError::Deserialization { body, .. } => {
                Some(body)
            }
            _ => None,
        }
    }
}
