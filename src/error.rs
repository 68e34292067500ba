// Error types for the RIP router

use std::net::Ipv4Addr;
use thiserror::Error;

use crate::rip::codec::FormatError;

/// Main error type for the router
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Malformed RIP datagram: {0}")]
    Format(#[from] FormatError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No route to host: {0}")]
    NotFound(Ipv4Addr),

    #[error("Platform error: {0}")]
    Platform(String),
}

/// Result type alias using RouterError
pub type RouterResult<T> = Result<T, RouterError>;

impl RouterError {
    /// Errors scoped to a single datagram. The event loop logs these and keeps going.
    pub fn is_per_message(&self) -> bool {
        matches!(
            self,
            RouterError::Format(_) | RouterError::NotFound(_) | RouterError::Platform(_)
        )
    }

    /// Short machine-readable code used by the status API
    pub fn code(&self) -> &'static str {
        match self {
            RouterError::Format(_) => "MalformedDatagram",
            RouterError::Io(_) => "IoError",
            RouterError::Config(_) => "InvalidConfiguration",
            RouterError::NotFound(_) => "NoRouteToHost",
            RouterError::Platform(_) => "PlatformError",
        }
    }
}
