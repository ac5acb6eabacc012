use thiserror::Error;

/// Failure modes for [`crate::Profile`] construction and lookups.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReportError {
    #[error("region id {0} is out of range (report has {1} regions)")]
    RegionOutOfRange(u64, usize),

    #[error("process index {0} is out of range (report has {1} processes)")]
    ProcessOutOfRange(u64, usize),

    #[error("cnode index {0} is out of range (report has {1} cnodes)")]
    CnodeOutOfRange(usize, usize),

    #[error(transparent)]
    Value(#[from] scorep_value::ValueError),
}
