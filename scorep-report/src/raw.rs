//! The mutable, builder-shaped in-memory report a profile reader (out of
//! scope per spec.md §1) is assumed to populate. [`crate::profile::Profile`]
//! consumes a `RawReport` once, at construction, and exposes only the
//! read-only contract of spec.md §4.2 from then on.
use std::collections::HashMap;

use rustc_hash::FxHashMap;
use scorep_value::Value;

use crate::cnode::{CallNode, CallNodeMeasurement, CnodeId};
use crate::metric::{Metric, MetricId};
use crate::region::{Region, RegionId};
use crate::system::SystemTree;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricValues {
    pub inclusive: Value,
    pub exclusive: Value,
}

#[derive(Debug, Default)]
pub struct RawReport {
    pub metrics: Vec<Metric>,
    pub root_metrics: Vec<MetricId>,
    pub regions: Vec<Region>,
    pub cnodes: Vec<CallNode>,
    pub root_cnodes: Vec<CnodeId>,
    pub system: SystemTree,
    /// `[location_group_index][cnode.0 as usize]`, one slot per cnode
    /// present in `cnodes`.
    pub measurements: Vec<Vec<CallNodeMeasurement>>,
    pub metric_values: FxHashMap<(MetricId, usize, CnodeId), MetricValues>,
    /// Report-global Cube attributes, e.g. keys under
    /// `Score-P::DefinitionCounters::*`.
    pub attributes: HashMap<String, String>,
    /// `true` when this profile was recorded sample-based (hits); `false`
    /// for enter/leave (visits) profiles. A report cannot carry both.
    pub has_hits: bool,
}

impl RawReport {
    pub fn new() -> RawReport {
        RawReport::default()
    }
}
