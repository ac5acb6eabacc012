//! Call tree nodes (cnodes), grounded on `cube::Cnode`. The tree shape
//! (region, parent, children, per-call-path parameter counts) is global —
//! shared across every process — while visit/time/hit counts are
//! per-(location-group, cnode) and live in [`crate::profile::Profile`]'s
//! measurement table, per spec.md §3's visits-are-per-process note.
use crate::region::RegionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CnodeId(pub u32);

#[derive(Debug, Clone)]
pub struct CallNode {
    pub region: RegionId,
    pub parent: Option<CnodeId>,
    pub children: Vec<CnodeId>,
    pub num_params_int: u32,
    pub num_params_str: u32,
}

/// One process/location-group's visit/time/hit counts at a single cnode.
/// Addition merges accelerator contributions into their owning process
/// (spec.md §3's accelerator-rollup rule); see
/// [`crate::profile::Profile::iterate_call_tree`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CallNodeMeasurement {
    pub visits: u64,
    pub time: f64,
    pub hits: u64,
}

impl CallNodeMeasurement {
    pub fn add(&self, other: &CallNodeMeasurement) -> CallNodeMeasurement {
        CallNodeMeasurement {
            visits: self.visits + other.visits,
            time: self.time + other.time,
            hits: self.hits + other.hits,
        }
    }
}

/// A single call-tree visitor callback, as delivered by
/// [`crate::profile::Profile::iterate_call_tree`]. `parent_region` is
/// `None` for a root cnode.
#[derive(Debug, Clone, Copy)]
pub struct CnodeVisit {
    pub process: usize,
    pub cnode: CnodeId,
    pub region: RegionId,
    pub parent_region: Option<RegionId>,
    pub visits: u64,
    pub time: f64,
    pub hits: u64,
    pub num_params_int: u32,
    pub num_params_str: u32,
}
