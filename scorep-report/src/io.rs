//! Loads a [`crate::Profile`] from a JSON dump of the in-memory report
//! model. The full Cube/OTF2 profile reader is out of scope per spec.md
//! §1 ("we assume a concrete in-memory report model ... is provided and
//! specify only the interface consumed"); this is the concrete adapter
//! that satisfies that interface, shared by the estimator CLI and the
//! protocol server's `OpenCube` handler so both plug into the same
//! report-construction path rather than each parsing the dump format on
//! its own.
use std::collections::HashMap;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;

use crate::cnode::{CallNode, CallNodeMeasurement, CnodeId};
use crate::error::ReportError;
use crate::profile::Profile;
use crate::raw::RawReport;
use crate::region::{Region, RegionId};
use crate::system::{Location, LocationGroup, LocationGroupKind};

#[derive(Debug, Error)]
pub enum ReportIoError {
    #[error("could not read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse '{path}' as a profile dump: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Report(#[from] ReportError),
}

#[derive(Debug, Deserialize)]
struct ProfileDump {
    #[serde(default)]
    regions: Vec<RegionDump>,
    #[serde(default)]
    cnodes: Vec<CnodeDump>,
    #[serde(default)]
    root_cnodes: Vec<u32>,
    #[serde(default)]
    location_groups: Vec<LocationGroupDump>,
    /// `[location_group_index][cnode_index]`.
    #[serde(default)]
    measurements: Vec<Vec<MeasurementDump>>,
    #[serde(default)]
    attributes: HashMap<String, String>,
    #[serde(default)]
    has_hits: bool,
}

#[derive(Debug, Deserialize)]
struct RegionDump {
    name: String,
    #[serde(default)]
    mangled_name: String,
    #[serde(default)]
    file: String,
    #[serde(default)]
    paradigm: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    is_program_root: bool,
    #[serde(default)]
    attributes: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct CnodeDump {
    region: u32,
    parent: Option<u32>,
    #[serde(default)]
    children: Vec<u32>,
    #[serde(default)]
    num_params_int: u32,
    #[serde(default)]
    num_params_str: u32,
}

#[derive(Debug, Deserialize)]
struct LocationGroupDump {
    name: String,
    kind: LocationGroupKindDump,
    #[serde(default)]
    creating_location_group: Option<String>,
    #[serde(default)]
    locations: Vec<LocationDump>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum LocationGroupKindDump {
    Process,
    Accelerator,
}

#[derive(Debug, Deserialize)]
struct LocationDump {
    name: String,
}

#[derive(Debug, Deserialize, Default)]
struct MeasurementDump {
    #[serde(default)]
    visits: u64,
    #[serde(default)]
    time: f64,
    #[serde(default)]
    hits: u64,
}

/// Reads `path` as a [`ProfileDump`] JSON document and builds a
/// [`Profile`] from it.
pub fn load_profile_dump(path: &Path) -> Result<Profile, ReportIoError> {
    let text = std::fs::read_to_string(path).map_err(|source| ReportIoError::Read {
        path: path.display().to_string(),
        source,
    })?;
    load_profile_dump_str(&text).map_err(|source| match source {
        ReportIoError::Parse { source, .. } => ReportIoError::Parse {
            path: path.display().to_string(),
            source,
        },
        other => other,
    })
}

/// Same as [`load_profile_dump`], but from an already-read JSON string —
/// the shape the protocol server's `OpenCube` handler and the estimator
/// CLI both reduce to once the path has been read from disk.
pub fn load_profile_dump_str(text: &str) -> Result<Profile, ReportIoError> {
    let dump: ProfileDump = serde_json::from_str(text).map_err(|source| ReportIoError::Parse {
        path: String::new(),
        source,
    })?;

    let mut raw = RawReport::new();
    raw.regions = dump
        .regions
        .into_iter()
        .map(|r| Region {
            name: r.name,
            mangled_name: r.mangled_name,
            file: r.file,
            paradigm_tag: r.paradigm,
            description: r.description,
            is_program_root: r.is_program_root,
            attributes: r.attributes,
        })
        .collect();
    raw.cnodes = dump
        .cnodes
        .into_iter()
        .map(|c| CallNode {
            region: RegionId(c.region),
            parent: c.parent.map(CnodeId),
            children: c.children.into_iter().map(CnodeId).collect(),
            num_params_int: c.num_params_int,
            num_params_str: c.num_params_str,
        })
        .collect();
    raw.root_cnodes = dump.root_cnodes.into_iter().map(CnodeId).collect();
    raw.system.location_groups = dump
        .location_groups
        .into_iter()
        .map(|g| LocationGroup {
            name: g.name,
            kind: match g.kind {
                LocationGroupKindDump::Process => LocationGroupKind::Process,
                LocationGroupKindDump::Accelerator => LocationGroupKind::Accelerator,
            },
            creating_location_group: g.creating_location_group,
            locations: g.locations.into_iter().map(|l| Location { name: l.name }).collect(),
        })
        .collect();
    raw.measurements = dump
        .measurements
        .into_iter()
        .map(|group| {
            group
                .into_iter()
                .map(|m| CallNodeMeasurement {
                    visits: m.visits,
                    time: m.time,
                    hits: m.hits,
                })
                .collect()
        })
        .collect();
    raw.attributes = dump.attributes;
    raw.has_hits = dump.has_hits;
    raw.metric_values = FxHashMap::default();

    Profile::build(raw).map_err(ReportIoError::Report)
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
        let profile = load_profile_dump(&path).unwrap();
        assert_eq!(profile.number_of_regions(), 1);
        assert_eq!(profile.number_of_processes(), 1);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = load_profile_dump_str("not json").unwrap_err();
        assert!(matches!(err, ReportIoError::Parse { .. }));
    }
}
