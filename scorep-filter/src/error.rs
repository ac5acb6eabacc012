use thiserror::Error;

/// `FilterParseError` in spec.md §7's error taxonomy: aborts filter-
/// dependent work (estimator `-f`, connection-side region filtering).
#[derive(Debug, Error)]
pub enum FilterParseError {
    #[error("unbalanced filter block: '{0}' without a matching BEGIN/END")]
    UnbalancedBlock(&'static str),

    #[error("unknown filter section keyword: '{0}'")]
    UnknownSection(String),

    #[error("invalid glob pattern '{pattern}': {source}")]
    BadPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}
