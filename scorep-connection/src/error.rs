use thiserror::Error;

use scorep_protocol::Severity;

/// Connection-layer failures (spec.md §4.9/§7): everything between "the
/// socket is open" and "a request's payload has been handed to the
/// request catalogue" lives here; payload-level failures are
/// [`scorep_requests::RequestError`].
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Protocol(#[from] scorep_protocol::ProtocolError),

    #[error(transparent)]
    Request(#[from] scorep_requests::RequestError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed while a request was still pending (sequence {0})")]
    ClosedWithPending(u64),

    #[error("response sequence {got} did not match any pending request (expected one of the waiter table's keys)")]
    UnmatchedSequence { got: u64 },

    #[error("server reported an unrecoverable error: {0}")]
    ServerUnrecoverable(String),

    #[error("server reported a recoverable error: {0}")]
    ServerRecoverable(String),

    #[error("connection was shut down locally")]
    Stopped,

    #[error("response did not have the shape this request expects")]
    UnexpectedResponse,
}

impl ConnectionError {
    /// Mirrors spec.md §7's recoverable/unrecoverable split for
    /// connection-layer failures; a caller that gets `Unrecoverable` must
    /// drop the connection rather than keep issuing requests on it.
    pub fn severity(&self) -> Severity {
        match self {
            ConnectionError::Protocol(e) => e.severity(),
            ConnectionError::Request(e) => e.severity(),
            ConnectionError::ServerRecoverable(_) => Severity::Recoverable,
            _ => Severity::Unrecoverable,
        }
    }
}
