//! The network seam.
//!
//! # Design
//! The core never performs I/O itself. Executing operations hand a built
//! [`HttpRequest`] to a caller-supplied [`Transport`] and feed the returned
//! [`HttpResponse`] into the matching parser. Connection pooling, timeouts,
//! cancellation and any retry policy belong to the transport; whatever it
//! reports is surfaced to the caller unchanged.

use thiserror::Error;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Failures reported by the transport, or a non-2xx answer from the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request timed out")]
    Timeout,

    #[error("request cancelled")]
    Cancelled,

    /// Connection, DNS or TLS failure.
    #[error("network failure: {0}")]
    Network(String),
}

impl TransportError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Executes one HTTP round trip.
///
/// Implementations must be safe to share between threads; the core issues
/// at most one `execute` per operation and never retries.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Send `request` through `transport`, logging the exchange.
pub(crate) fn send(transport: &dyn Transport, request: HttpRequest) -> Result<HttpResponse, ApiError> {
    let method = request.method;
    let path = request.path.clone();
    tracing::debug!(%method, %path, "sending request");
    let response = transport.execute(request)?;
    if !response.is_success() {
        tracing::warn!(%method, %path, status = response.status, "request failed");
    }
    Ok(response)
}

/// Map non-success status codes to [`TransportError::Status`].
pub(crate) fn check_success(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(TransportError::Status {
        status: response.status,
        body: response.body.clone(),
    }
    .into())
}
