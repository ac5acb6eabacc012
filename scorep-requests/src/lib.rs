//! The cube network protocol's request catalogue (spec.md §4.8): one
//! variant per operation, its wire payload codec, and its server-side
//! execution against a [`scorep_report::Profile`] held by a
//! [`CubeSession`]. The connection layer (crate `scorep-connection`) owns
//! framing and transport; this crate owns everything inside a frame's
//! body.

mod catalogue;
mod error;
pub mod request;
mod selection;
mod session;
mod tree;

pub use catalogue::RequestId;
pub use error::RequestError;
pub use request::{
    FileSystemEntry, MetricDefinition, Request, Response, TreeSelector, LIBRARY_VERSION,
};
pub use selection::{Selection, SelectionMode};
pub use session::CubeSession;

use std::path::Path;

use scorep_report::Profile;

/// Loads the report a `OpenCube` request names. Shared with the estimator
/// CLI's own profile loading so both plug into the same concrete adapter
/// (spec.md §1: "we assume a concrete in-memory report model ... is
/// provided").
pub fn open_report_file(path: &str) -> Result<Profile, RequestError> {
    scorep_report::io::load_profile_dump(Path::new(path))
        .map_err(|e| RequestError::OpenFailed(path.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_report_file_reports_missing_path() {
        let err = open_report_file("/nonexistent/report.json").unwrap_err();
        assert!(matches!(err, RequestError::OpenFailed(..)));
    }
}
