//! Error types for the dispatch client.
//!
//! # Design
//! `DispatchError` covers what can go wrong before a request leaves the
//! process (unknown names, unresolved path placeholders, invalid headers,
//! unserializable bodies) plus `Transport` for callers that opt into rejecting on transport
//! failure. HTTP status failures and unparseable bodies never surface here;
//! they are reported through [`ResponseEnvelope`](crate::ResponseEnvelope).

use thiserror::Error;

/// Errors returned by an operation call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DispatchError {
    #[error("unknown resource: {0}")]
    UnknownResource(String),

    #[error("unknown operation {nickname} on resource {resource}")]
    UnknownOperation { resource: String, nickname: String },

    #[error("parameters for {0} must be a JSON object")]
    InvalidParams(String),

    /// A `{placeholder}` in the path template had no non-empty value.
    #[error("path parameter {0} is undefined")]
    UnresolvedPathParameter(String),

    /// A path value would itself have left a `{placeholder}` in the URL.
    #[error("value for path parameter {0} contains a placeholder")]
    PlaceholderInPathValue(String),

    /// A header name or value cannot be sent on the wire.
    #[error("invalid header {0}")]
    InvalidHeader(String),

    #[error("failed to serialize request body")]
    Serialization(#[source] serde_json::Error),

    #[error("transport failed")]
    Transport(#[from] TransportError),
}

/// Failures that produced no HTTP response.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Errors raised while loading a resource specification.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SpecError {
    #[error("invalid resource specification")]
    Parse(#[source] serde_json::Error),
}
