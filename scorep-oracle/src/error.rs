use thiserror::Error;

/// `OracleFailure` in spec.md §7's error taxonomy: fatal for the estimator,
/// since every subsequent byte computation depends on this table.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("could not create temp file for the otf2-estimator script: {0}")]
    TempFile(#[source] std::io::Error),

    #[error("could not spawn otf2-estimator ('{tool}'): {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("otf2-estimator exited with a non-zero status: {0}")]
    NonZeroExit(std::process::ExitStatus),

    #[error("could not parse otf2-estimator output line: '{0}'")]
    UnparsableLine(String),

    #[error("event '{0}' has no entry in the event-size oracle")]
    UnknownEvent(String),

    #[error("io error talking to otf2-estimator: {0}")]
    Io(#[from] std::io::Error),
}
