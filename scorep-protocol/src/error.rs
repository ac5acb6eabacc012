use thiserror::Error;

/// Whether a protocol failure leaves the connection in a consistent state
/// (spec.md §4.7/§7): recoverable failures let the client keep using the
/// connection; unrecoverable ones mean the client must drop it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Recoverable,
    Unrecoverable,
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("endianness handshake failed: sentinel did not decode to 1 after byte-swap")]
    EndiannessMismatch,

    #[error("truncated frame: expected at least {expected} bytes, got {actual}")]
    TruncatedFrame { expected: usize, actual: usize },

    #[error("request id {0} is not registered for protocol version {1}")]
    UnknownRequestId(u32, u32),

    #[error("unknown value type tag {0} on the wire")]
    UnknownValueType(u32),

    #[error("string was not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error(transparent)]
    Value(#[from] scorep_value::ValueError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Classifies this error per spec.md §4.7's error surface: a framing
    /// inconsistency, an id unknown to the negotiated protocol version, or
    /// a premature EOF is unrecoverable; everything else (a malformed
    /// string body, a value shape mismatch) is recoverable.
    pub fn severity(&self) -> Severity {
        match self {
            ProtocolError::EndiannessMismatch
            | ProtocolError::TruncatedFrame { .. }
            | ProtocolError::UnknownRequestId(..)
            | ProtocolError::UnknownValueType(..) => Severity::Unrecoverable,
            ProtocolError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Severity::Unrecoverable
            }
            _ => Severity::Recoverable,
        }
    }
}
