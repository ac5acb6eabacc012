//! CLI-facing wrapper around [`scorep_report::load_profile_dump`]: the
//! estimator's only extra concern over the shared loader is mapping its
//! error into [`EstimatorError`], since `scorep-score` (unlike the
//! protocol server) reports failures by exiting non-zero rather than
//! encoding a response code.
use std::path::Path;

use crate::error::EstimatorError;

pub fn load_profile(path: &Path) -> Result<scorep_report::Profile, EstimatorError> {
    scorep_report::load_profile_dump(path).map_err(|source| EstimatorError::ProfileLoad {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_minimal_profile_dump() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        std::fs::write(
            &path,
            r#"{
                "regions": [{"name": "A", "mangled_name": "A", "paradigm": "user"}],
                "cnodes": [{"region": 0, "parent": null, "children": []}],
                "root_cnodes": [0],
                "location_groups": [{"name": "rank 0", "kind": "process", "locations": [{"name": "thread 0"}]}],
                "measurements": [[{"visits": 10, "time": 1.0, "hits": 0}]]
            }"#,
        )
        .unwrap();
        let profile = load_profile(&path).unwrap();
        assert_eq!(profile.number_of_regions(), 1);
        assert_eq!(profile.number_of_processes(), 1);
    }
}
