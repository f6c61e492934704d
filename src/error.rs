//! Unified error type.

use std::fmt;

use thiserror::Error;

/// Boxed error produced by request bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by hitch's fallible operations.
///
/// Per-request variants (`Body`, `Decode`, `ParamsNotFound`, `Access`,
/// `Size`) are meant to be turned into a JSON envelope at the endpoint
/// boundary; see [`error_response`](crate::error_response) and friends.
/// The rest surface startup and infrastructure failures.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid listen address `{addr}`: {source}")]
    Addr {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("invalid route `{path}`: {source}")]
    Route {
        path: String,
        #[source]
        source: matchit::InsertError,
    },

    #[error("no value for configuration key(s): {}", .0.join(", "))]
    MissingConfig(Vec<String>),

    /// Reading the request body failed, including hitting a stream cap.
    #[error("failed to read request body: {0}")]
    Body(#[source] BoxError),

    /// The body was not JSON of the expected shape.
    #[error("failed to decode body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no params in context")]
    ParamsNotFound,

    #[error("No Access")]
    Access,

    #[error("{0}")]
    Size(String),
}

/// Panic payload raised when a [`JsonResult`](crate::JsonResult) cannot be
/// encoded.
///
/// The router's panic handler downcasts to this type, logs it and answers the
/// current request with a 500 envelope. Nothing outside that request is
/// affected.
#[derive(Debug)]
pub struct SerializationFault(pub serde_json::Error);

impl fmt::Display for SerializationFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "response serialization failed: {}", self.0)
    }
}

impl std::error::Error for SerializationFault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}
