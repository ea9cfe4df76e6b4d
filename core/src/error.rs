//! Error types for the Fuel dispatcher.
//!
//! # Design
//! `InvalidArgument` is raised while a request is being built, so it never
//! reaches the transport. `Transport` wraps whatever the transport reported
//! and is passed through untouched. `Http` only comes out of the convenience
//! path (`fetch_*`, `get_text`, `get_json`); the verb methods hand back the
//! raw response whatever its status.

use std::io;

use thiserror::Error;

/// Errors returned by `Fuel` and the request/response descriptors.
#[derive(Debug, Error)]
pub enum FuelError {
    /// The request shape was rejected before any I/O happened.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The transport failed to complete the exchange.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The exchange completed with a status outside 200-299.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The dispatcher was closed before the call.
    #[error("dispatcher is closed")]
    Closed,
}

impl FuelError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        FuelError::InvalidArgument(msg.into())
    }

    /// Status code carried by an `Http` failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            FuelError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failures reported by a `Transport`. Opaque to the dispatcher.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport has been shut down")]
    Shutdown,

    /// The engine refused to hand back a response for this status. Only
    /// happens with agents that treat 4xx/5xx as errors.
    #[error("engine rejected status {0}")]
    Status(u16),

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("transport failure: {source}")]
    Engine {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl TransportError {
    /// Wrap an engine-specific error.
    pub fn engine(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        TransportError::Engine {
            source: source.into(),
        }
    }
}

impl From<ureq::Error> for TransportError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Io(source) => TransportError::Io { source },
            ureq::Error::StatusCode(status) => TransportError::Status(status),
            other => TransportError::engine(other),
        }
    }
}
