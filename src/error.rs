//! Call error taxonomy

use thiserror::Error;

/// Why a call did not produce data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// Method is not in the registry. Raised before any I/O.
    #[error("Unknown RPC method: {0}")]
    UnknownMethod(String),

    /// A mandatory kwarg is missing (or kwargs are malformed). Raised before any I/O.
    #[error("Missing or invalid argument: {0}")]
    InvalidArgument(String),

    /// Connection lost, timeout, or unreadable response
    #[error("Transport failure: {message}")]
    Transport { message: String },

    /// The daemon ran the call and reported an error
    #[error("{message}")]
    Remote {
        message: String,
        stack: Option<String>,
        code: Option<String>,
    },
}

impl CallError {
    /// Stable error code
    pub fn code(&self) -> &str {
        match self {
            CallError::UnknownMethod(_) => "UNKNOWN_METHOD",
            CallError::InvalidArgument(_) => "INVALID_ARGUMENT",
            CallError::Transport { .. } => "TRANSPORT_FAILURE",
            CallError::Remote { code: Some(code), .. } => code,
            CallError::Remote { .. } => "REMOTE_FAILURE",
        }
    }

    /// Whether the caller may try again. This layer itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CallError::Transport { .. } | CallError::Remote { .. })
    }

    /// Remote stack trace, if the daemon sent one
    pub fn stack(&self) -> Option<&str> {
        match self {
            CallError::Remote { stack, .. } => stack.as_deref(),
            _ => None,
        }
    }
}

/// Failure of the transport layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("failed to start daemon bridge: {0}")]
    Spawn(String),
    #[error("failed to write request: {0}")]
    Write(String),
    #[error("connection closed before a response arrived")]
    Closed,
    #[error("no response within {0} ms")]
    Timeout(u64),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<TransportError> for CallError {
    fn from(e: TransportError) -> Self {
        CallError::Transport {
            message: e.to_string(),
        }
    }
}
