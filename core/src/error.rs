//! Error types for the FleetLock client.
//!
//! # Design
//! Construction problems (`ConfigError`) are kept apart from per-call
//! failures (`ClientError`) since the former are never retryable. A call can
//! fail before the server answers (`Encode`, `Transport`) or because of what
//! it answered: a structured `Server` error, an error body that does not
//! decode, or a status outside every range the protocol defines.

use thiserror::Error;

use crate::types::ServerError;

/// Errors returned by `FleetLockClient::new`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ID is required")]
    MissingId,

    #[error("URL is required")]
    MissingUrl,

    #[error("parsing URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: url::ParseError },
}

/// Failure of a transport to produce a response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The caller's cancellation token fired before the response arrived.
    #[error("request cancelled")]
    Cancelled,

    /// reqwest keeps the root cause (refused connection, DNS or TLS failure)
    /// in its source chain; the message carries the whole chain.
    #[error("{}", render_chain(.0))]
    Request(reqwest::Error),

    /// Failure reported by a custom transport.
    #[error("{0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Request(err)
    }
}

impl TransportError {
    pub fn other(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        TransportError::Other(err.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransportError::Cancelled)
    }
}

/// Errors returned by the protocol operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request payload could not be serialized to JSON.
    #[error("encoding the payload: {0}")]
    Encode(serde_json::Error),

    /// No response was received. Classification was not attempted.
    #[error("doing the request: {0}")]
    Transport(TransportError),

    /// A 3xx-5xx body that is not a valid error envelope.
    #[error("unmarshalling error: {0}")]
    Decode(serde_json::Error),

    /// The server rejected the call with a structured error, e.g. no slot
    /// is currently available.
    #[error("fleetlock error: {0}")]
    Server(ServerError),

    /// Status outside both the success and error ranges.
    #[error("unexpected status code: {0}")]
    UnexpectedStatus(u16),
}

// Causes are rendered inline, down to the root, so no `source()` is exposed;
// an error chain printed with `{:#}` would otherwise repeat them.
impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        ClientError::Transport(err)
    }
}

impl ClientError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Transport(e) if e.is_cancelled())
    }
}

/// `err` followed by each of its sources, joined with `": "`.
fn render_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut cause = err.source();
    while let Some(err) = cause {
        out.push_str(": ");
        out.push_str(&err.to_string());
        cause = err.source();
    }
    out
}
