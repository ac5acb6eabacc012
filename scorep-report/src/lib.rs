//! The read-only report model adapter (spec.md §4.2) over a completed
//! call-path profile: metric tree, call tree, region table, system tree,
//! plus the derived facts (COM-tainted groups, accelerator rollup,
//! shortened file names) the rest of the workspace needs and that spec.md
//! §3 calls out as adapter-owned invariants.

mod cnode;
mod error;
mod group;
pub mod io;
mod metric;
mod profile;
mod raw;
mod region;
mod system;

pub use cnode::{CallNode, CallNodeMeasurement, CnodeId, CnodeVisit};
pub use error::ReportError;
pub use group::{default_posture, FilterPosture, Group};
pub use io::{load_profile_dump, load_profile_dump_str, ReportIoError};
pub use metric::{CubePlExpressions, Metric, MetricId, MetricKind};
pub use profile::{Flavour, Profile};
pub use raw::{MetricValues, RawReport};
pub use region::{derive_base_group, Paradigm, Region, RegionId};
pub use system::{Location, LocationGroup, LocationGroupKind, SystemTree};
