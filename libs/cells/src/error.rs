use std::time::Duration;

/// Errors surfaced by the cells messaging core.
///
/// Callers of the higher-level operations only ever see these categories;
/// which internal resolver step produced them is deliberately not encoded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CellsError {
    /// Malformed method name, missing argument, or a local misconfiguration.
    /// Always raised locally, never sent over the wire.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Cell-name or topic resolution failed syntactically.
    #[error("Unknown destination: {0}")]
    UnknownDestination(String),

    /// The destination cell reported a failure while executing a call.
    /// Carries the remote's own error classification and message, unchanged.
    #[error("Remote execution failed ({kind}): {message}")]
    RemoteExecution { kind: String, message: String },

    /// No response arrived within the call timeout.
    #[error("Timed out after {0:?} waiting for a reply")]
    Timeout(Duration),

    /// The broker could not accept a cast or initiate a call.
    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),
}

impl CellsError {
    /// A locally detected bad input: malformed method name, missing required
    /// argument, or a misconfiguration caught before anything was sent.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        CellsError::InvalidArgument(msg.into())
    }

    /// A destination that could not be resolved because its name or topic is
    /// syntactically invalid.
    pub fn unknown_destination(msg: impl Into<String>) -> Self {
        CellsError::UnknownDestination(msg.into())
    }

    /// A failure reported by the destination cell, carrying its own error
    /// classification and message unchanged.
    pub fn remote(kind: impl Into<String>, message: impl Into<String>) -> Self {
        CellsError::RemoteExecution {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// A call that saw no response within the given window.
    pub fn timeout(elapsed: Duration) -> Self {
        CellsError::Timeout(elapsed)
    }

    /// A broker that could not accept a cast or initiate a call.
    pub fn transport_unavailable(msg: impl Into<String>) -> Self {
        CellsError::TransportUnavailable(msg.into())
    }

    /// Check if this error was raised locally, before anything hit the wire
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            CellsError::InvalidArgument(_) | CellsError::UnknownDestination(_)
        )
    }

    /// Check if this error came back from the destination cell
    pub fn is_remote(&self) -> bool {
        matches!(self, CellsError::RemoteExecution { .. })
    }

    /// Check if this is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, CellsError::Timeout(_))
    }
}

/// Result type for cells messaging operations
pub type CellsResult<T> = std::result::Result<T, CellsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(CellsError::invalid_argument("empty method").is_local());
        assert!(CellsError::unknown_destination("bad..name").is_local());
        assert!(!CellsError::remote("InstanceNotFound", "gone").is_local());

        assert!(CellsError::remote("InstanceNotFound", "gone").is_remote());
        assert!(!CellsError::timeout(Duration::from_secs(30)).is_remote());

        assert!(CellsError::timeout(Duration::from_secs(30)).is_timeout());
        assert!(!CellsError::transport_unavailable("broker down").is_timeout());
    }

    #[test]
    fn test_remote_error_preserves_remote_info() {
        let err = CellsError::remote("ComputeHostNotFound", "no host named compute-7");
        assert_eq!(
            err.to_string(),
            "Remote execution failed (ComputeHostNotFound): no host named compute-7"
        );
    }
}
