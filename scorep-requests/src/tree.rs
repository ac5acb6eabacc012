//! Tree traversal and cross-axis aggregation shared by the tree/subtree
//! query requests (spec.md §4.8): each query fixes one tree as the index
//! axis (metric, callpath, flat region, or system) and sums `Value`s over
//! the other two axes, selected via [`crate::selection::Selection`].
use scorep_report::{CnodeId, MetricId, Profile, RegionId, ReportError};
use scorep_value::Value;

/// Metric tree in DFS order, parents before children — the index axis for
/// `MetricTreeValues`/`MetricSubtreeValues`.
pub fn metric_dfs_order(profile: &Profile) -> Vec<MetricId> {
    let mut order = Vec::with_capacity(profile.number_of_metrics());
    let mut stack: Vec<MetricId> = profile.root_metrics().iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        order.push(id);
        if let Some(m) = profile.metrics().get(id.0 as usize) {
            stack.extend(m.children.iter().rev().copied());
        }
    }
    order
}

/// Call tree in DFS order, global (not per-process) shape — the index axis
/// for `CallpathTreeValues`/`CallpathSubtreeValues`.
pub fn callpath_dfs_order(profile: &Profile) -> Vec<CnodeId> {
    let mut order = Vec::with_capacity(profile.cnodes().len());
    let mut stack: Vec<CnodeId> = profile.root_cnodes().iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        order.push(id);
        if let Some(node) = profile.cnodes().get(id.0 as usize) {
            stack.extend(node.children.iter().rev().copied());
        }
    }
    order
}

/// Region table in declaration order — the index axis for `FlatTreeValues`.
pub fn flat_region_order(profile: &Profile) -> Vec<RegionId> {
    (0..profile.number_of_regions() as u32).map(RegionId).collect()
}

/// Process ordinals in declaration order — the index axis for
/// `SystemTreeValues`.
pub fn system_dfs_order(profile: &Profile) -> Vec<usize> {
    (0..profile.number_of_processes()).collect()
}

/// Every cnode whose region is `region` (a flat profile's region-to-cnode
/// fan-in, spec.md §4.8's "difference = inclusive - exclusive" note implies
/// this same aggregation for `FlatTreeValues`).
pub fn cnodes_for_region(profile: &Profile, region: RegionId) -> Vec<CnodeId> {
    profile
        .cnodes()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.region == region)
        .map(|(i, _)| CnodeId(i as u32))
        .collect()
}

/// Sums `profile.aggregated_value` over every (metric, cnode, process)
/// combination in the cartesian product of the three selected id lists,
/// returning the neutral element of `fallback_tag` when nothing measured.
pub fn sum_value(
    profile: &Profile,
    metrics: &[MetricId],
    cnodes: &[CnodeId],
    processes: &[usize],
    flavour: scorep_report::Flavour,
) -> Result<Value, ReportError> {
    let mut acc: Option<Value> = None;
    for &metric in metrics {
        for &cnode in cnodes {
            for &process in processes {
                if let Some(v) = profile.aggregated_value(process, cnode, metric, flavour)? {
                    acc = Some(match acc {
                        Some(prev) => prev.add(&v).map_err(ReportError::Value)?,
                        None => v,
                    });
                }
            }
        }
    }
    match acc {
        Some(v) => Ok(v),
        None => {
            let tag = metrics
                .first()
                .and_then(|m| profile.metrics().get(m.0 as usize))
                .map(|m| m.data_type)
                .unwrap_or(scorep_value::ValueType::Uint64);
            Value::neutral_sum(tag, None).map_err(ReportError::Value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorep_report::{CallNode, RawReport};

    fn minimal_profile() -> Profile {
        let mut raw = RawReport::new();
        raw.regions.push(scorep_report::Region {
            name: "main".to_string(),
            ..Default::default()
        });
        raw.cnodes.push(CallNode {
            region: RegionId(0),
            parent: None,
            children: vec![],
            num_params_int: 0,
            num_params_str: 0,
        });
        raw.root_cnodes.push(CnodeId(0));
        Profile::build(raw).unwrap()
    }

    #[test]
    fn flat_region_order_covers_every_region() {
        let profile = minimal_profile();
        assert_eq!(flat_region_order(&profile), vec![RegionId(0)]);
    }

    #[test]
    fn cnodes_for_region_finds_the_single_matching_node() {
        let profile = minimal_profile();
        assert_eq!(cnodes_for_region(&profile, RegionId(0)), vec![CnodeId(0)]);
    }

    #[test]
    fn sum_of_nothing_selected_is_neutral() {
        let profile = minimal_profile();
        let v = sum_value(&profile, &[], &[], &[], scorep_report::Flavour::Inclusive).unwrap();
        assert_eq!(v, Value::Uint64(0));
    }
}
