use thiserror::Error;

#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error(transparent)]
    Report(#[from] scorep_report::ReportError),

    #[error(transparent)]
    Oracle(#[from] scorep_oracle::OracleError),

    #[error(transparent)]
    Filter(#[from] scorep_filter::FilterParseError),

    #[error(transparent)]
    Value(#[from] scorep_value::ValueError),

    #[error("could not read filter file '{path}': {source}")]
    FilterFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write filter file '{path}': {source}")]
    FilterFileWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read profile '{path}': {source}")]
    ProfileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not load profile '{path}': {source}")]
    ProfileLoad {
        path: String,
        #[source]
        source: scorep_report::ReportIoError,
    },
}
