use thiserror::Error;

use scorep_protocol::Severity;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request id {0} is not registered for protocol version {1}")]
    UnknownRequestId(u32, u32),

    #[error(transparent)]
    Protocol(#[from] scorep_protocol::ProtocolError),

    #[error(transparent)]
    Report(#[from] scorep_report::ReportError),

    #[error(transparent)]
    Value(#[from] scorep_value::ValueError),

    #[error("no report is open; call OpenCube first")]
    NoReportOpen,

    #[error("cannot open '{0}': {1}")]
    OpenFailed(String, String),

    #[error("cannot save to '{0}': {1}")]
    SaveFailed(String, String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RequestError {
    /// Classifies this failure per spec.md §4.7's recoverable/unrecoverable
    /// split: anything that leaves the connection's framing intact (a bad
    /// path, a missing report, a malformed metric definition) is
    /// recoverable; a protocol-level inconsistency is not.
    pub fn severity(&self) -> Severity {
        match self {
            RequestError::Protocol(e) => e.severity(),
            RequestError::UnknownRequestId(..) => Severity::Unrecoverable,
            _ => Severity::Recoverable,
        }
    }
}
