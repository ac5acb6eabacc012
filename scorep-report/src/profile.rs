//! The read-only report model adapter (spec.md §4.2): the only surface the
//! rest of the workspace (estimator, protocol request handlers) consumes.
//! Everything that needs to be precomputed once — COM-taint, accelerator
//! rollup, path-prefix stripping, definition counters, the max-program-
//! arguments scan — happens in [`Profile::build`], matching the "Lifecycles"
//! paragraph of spec.md §3: "Report model is loaded once... otherwise
//! read-only."
use std::collections::HashMap;

use log::warn;
use rustc_hash::FxHashMap;
use scorep_value::Value;

use crate::cnode::{CallNode, CallNodeMeasurement, CnodeId, CnodeVisit};
use crate::error::ReportError;
use crate::group::Group;
use crate::metric::{Metric, MetricId};
use crate::raw::{MetricValues, RawReport};
use crate::region::{derive_base_group, Region, RegionId};
use crate::system::{LocationGroupKind, SystemTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavour {
    Inclusive,
    Exclusive,
}

#[derive(Clone)]
pub struct Profile {
    metrics: Vec<Metric>,
    root_metrics: Vec<MetricId>,
    regions: Vec<Region>,
    cnodes: Vec<CallNode>,
    root_cnodes: Vec<CnodeId>,
    system: SystemTree,
    measurements: Vec<Vec<CallNodeMeasurement>>,
    metric_values: FxHashMap<(MetricId, usize, CnodeId), MetricValues>,
    has_hits: bool,

    tainted_groups: Vec<Group>,
    /// Process ordinal -> index into `system.location_groups`.
    process_location_group_index: Vec<usize>,
    /// Process ordinal -> accelerator location-group indices rolled into it.
    accelerator_rollup: Vec<Vec<usize>>,
    definition_counters: HashMap<String, u64>,
    number_of_program_arguments: i64,
    path_prefix: String,
    max_locations_per_process: usize,
}

impl Profile {
    pub fn build(raw: RawReport) -> Result<Profile, ReportError> {
        let tainted_groups = compute_tainted_groups(&raw.regions, &raw.cnodes, &raw.root_cnodes);

        let process_location_group_index: Vec<usize> = raw
            .system
            .process_groups()
            .map(|(idx, _)| idx)
            .collect();

        let mut process_by_name: HashMap<&str, usize> = HashMap::new();
        for (ordinal, &lg_idx) in process_location_group_index.iter().enumerate() {
            process_by_name.insert(raw.system.location_groups[lg_idx].name.as_str(), ordinal);
        }

        let mut accelerator_rollup = vec![Vec::new(); process_location_group_index.len()];
        for (idx, lg) in raw.system.location_groups.iter().enumerate() {
            if lg.kind != LocationGroupKind::Accelerator {
                continue;
            }
            match lg.creating_location_group.as_deref() {
                Some(name) => match process_by_name.get(name) {
                    Some(&ordinal) => accelerator_rollup[ordinal].push(idx),
                    None => warn!(
                        "accelerator location group '{}' names unknown creating location group '{}'; dropping",
                        lg.name, name
                    ),
                },
                None => warn!(
                    "accelerator location group '{}' has no creating location group attribute; dropping",
                    lg.name
                ),
            }
        }

        let max_locations_per_process = process_location_group_index
            .iter()
            .enumerate()
            .map(|(ordinal, &lg_idx)| {
                let own = raw.system.location_groups[lg_idx].locations.len();
                let accel: usize = accelerator_rollup[ordinal]
                    .iter()
                    .map(|&a| raw.system.location_groups[a].locations.len())
                    .sum();
                own + accel
            })
            .max()
            .unwrap_or(0);

        let definition_counters = parse_definition_counters(&raw.attributes);
        let number_of_program_arguments = raw
            .regions
            .iter()
            .filter_map(|r| {
                r.attributes
                    .get("Score-P::ProgramArguments::numberOfArguments")
                    .and_then(|v| v.parse::<i64>().ok())
            })
            .max()
            .unwrap_or(-1);

        let path_prefix = compute_path_prefix(&raw.regions, &tainted_groups);

        Ok(Profile {
            metrics: raw.metrics,
            root_metrics: raw.root_metrics,
            regions: raw.regions,
            cnodes: raw.cnodes,
            root_cnodes: raw.root_cnodes,
            system: raw.system,
            measurements: raw.measurements,
            metric_values: raw.metric_values,
            has_hits: raw.has_hits,
            tainted_groups,
            process_location_group_index,
            accelerator_rollup,
            definition_counters,
            number_of_program_arguments,
            path_prefix,
            max_locations_per_process,
        })
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn root_metrics(&self) -> &[MetricId] {
        &self.root_metrics
    }

    pub fn ghost_metrics(&self) -> Vec<MetricId> {
        self.metrics
            .iter()
            .enumerate()
            .filter(|(_, m)| m.ghost)
            .map(|(i, _)| MetricId(i as u32))
            .collect()
    }

    pub fn cnodes(&self) -> &[CallNode] {
        &self.cnodes
    }

    pub fn root_cnodes(&self) -> &[CnodeId] {
        &self.root_cnodes
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, r: RegionId) -> Result<&Region, ReportError> {
        self.regions
            .get(r.0 as usize)
            .ok_or(ReportError::RegionOutOfRange(r.0 as u64, self.regions.len()))
    }

    pub fn region_name(&self, r: RegionId) -> Result<&str, ReportError> {
        Ok(self.region(r)?.name.as_str())
    }

    pub fn mangled_name(&self, r: RegionId) -> Result<&str, ReportError> {
        Ok(self.region(r)?.mangled_name.as_str())
    }

    pub fn file_name(&self, r: RegionId) -> Result<&str, ReportError> {
        Ok(self.region(r)?.file.as_str())
    }

    /// Strips the longest common file-name prefix among USR+COM regions
    /// with non-empty paths, per spec.md §4.2.
    pub fn short_file_name(&self, r: RegionId) -> Result<&str, ReportError> {
        let file = self.file_name(r)?;
        Ok(file.strip_prefix(self.path_prefix.as_str()).unwrap_or(file))
    }

    pub fn number_of_processes(&self) -> usize {
        self.process_location_group_index.len()
    }

    pub fn number_of_regions(&self) -> usize {
        self.regions.len()
    }

    pub fn number_of_metrics(&self) -> usize {
        self.metrics.len()
    }

    pub fn max_locations_per_process(&self) -> usize {
        self.max_locations_per_process
    }

    pub fn definition_counters(&self) -> &HashMap<String, u64> {
        &self.definition_counters
    }

    pub fn number_of_program_arguments(&self) -> i64 {
        self.number_of_program_arguments
    }

    pub fn has_hits(&self) -> bool {
        self.has_hits
    }

    /// The COM-tainted group for region `r` (spec.md §3/§4.2). This is the
    /// group every other part of the workspace should use — never the
    /// static `derive_base_group`.
    pub fn group(&self, r: RegionId) -> Result<Group, ReportError> {
        self.tainted_groups
            .get(r.0 as usize)
            .copied()
            .ok_or(ReportError::RegionOutOfRange(r.0 as u64, self.regions.len()))
    }

    pub fn is_root_region(&self, r: RegionId) -> Result<bool, ReportError> {
        Ok(self.region(r)?.is_program_root)
    }

    pub fn is_dynamic_region(&self, r: RegionId) -> Result<bool, ReportError> {
        Ok(self.region(r)?.is_dynamic())
    }

    pub fn omit_in_trace_enter_leave_events(&self, r: RegionId) -> Result<bool, ReportError> {
        Ok(self.region(r)?.omit_in_trace_enter_leave_events())
    }

    fn cnode(&self, c: CnodeId) -> Result<&CallNode, ReportError> {
        self.cnodes
            .get(c.0 as usize)
            .ok_or(ReportError::CnodeOutOfRange(c.0 as usize, self.cnodes.len()))
    }

    fn process_measurement(
        &self,
        process: usize,
        cnode: CnodeId,
    ) -> Result<CallNodeMeasurement, ReportError> {
        if process >= self.process_location_group_index.len() {
            return Err(ReportError::ProcessOutOfRange(
                process as u64,
                self.process_location_group_index.len(),
            ));
        }
        let lg = self.process_location_group_index[process];
        let idx = cnode.0 as usize;
        let mut total = self
            .measurements
            .get(lg)
            .and_then(|v| v.get(idx))
            .copied()
            .unwrap_or_default();
        for &accel_lg in &self.accelerator_rollup[process] {
            if let Some(m) = self.measurements.get(accel_lg).and_then(|v| v.get(idx)) {
                total = total.add(m);
            }
        }
        Ok(total)
    }

    /// Invokes `visitor` for every call node reachable from `process`'s
    /// root cnodes, in DFS order, matching spec.md §4.2's
    /// `iterateCallTree(process, visitor)`.
    pub fn iterate_call_tree(
        &self,
        process: usize,
        mut visitor: impl FnMut(CnodeVisit),
    ) -> Result<(), ReportError> {
        let mut stack: Vec<CnodeId> = self.root_cnodes.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = self.cnode(id)?;
            let measurement = self.process_measurement(process, id)?;
            let parent_region = match node.parent {
                Some(p) => Some(self.cnode(p)?.region),
                None => None,
            };
            visitor(CnodeVisit {
                process,
                cnode: id,
                region: node.region,
                parent_region,
                visits: measurement.visits,
                time: measurement.time,
                hits: measurement.hits,
                num_params_int: node.num_params_int,
                num_params_str: node.num_params_str,
            });
            stack.extend(node.children.iter().rev().copied());
        }
        Ok(())
    }

    /// Sums `metric`'s value for one PROCESS location group and every
    /// ACCELERATOR group rolled into it, per spec.md §4.2.
    pub fn aggregated_value(
        &self,
        process: usize,
        cnode: CnodeId,
        metric: MetricId,
        flavour: Flavour,
    ) -> Result<Option<Value>, ReportError> {
        if process >= self.process_location_group_index.len() {
            return Err(ReportError::ProcessOutOfRange(
                process as u64,
                self.process_location_group_index.len(),
            ));
        }
        let lg = self.process_location_group_index[process];
        let mut groups_to_sum = vec![lg];
        groups_to_sum.extend(self.accelerator_rollup[process].iter().copied());

        let mut acc: Option<Value> = None;
        for g in groups_to_sum {
            if let Some(mv) = self.metric_values.get(&(metric, g, cnode)) {
                let v = match flavour {
                    Flavour::Inclusive => &mv.inclusive,
                    Flavour::Exclusive => &mv.exclusive,
                };
                acc = Some(match acc {
                    Some(prev) => prev.add(v).map_err(ReportError::Value)?,
                    None => v.clone(),
                });
            }
        }
        Ok(acc)
    }
}

fn parse_definition_counters(attributes: &HashMap<String, String>) -> HashMap<String, u64> {
    const PREFIX: &str = "Score-P::DefinitionCounters::";
    let mut counters = HashMap::new();
    for (key, value) in attributes {
        if let Some(name) = key.strip_prefix(PREFIX) {
            match value.parse::<u64>() {
                Ok(n) => {
                    counters.insert(name.to_string(), n);
                }
                Err(_) => warn!("definition counter '{key}' has non-integer value '{value}'; dropping"),
            }
        }
    }
    counters
}

fn compute_path_prefix(regions: &[Region], tainted_groups: &[Group]) -> String {
    let mut prefix: Option<String> = None;
    for (idx, region) in regions.iter().enumerate() {
        let group = tainted_groups[idx];
        if !matches!(group, Group::Usr | Group::Com) || region.file.is_empty() {
            continue;
        }
        prefix = Some(match prefix {
            None => region.file.clone(),
            Some(p) => common_prefix(&p, &region.file),
        });
    }
    prefix.unwrap_or_default()
}

fn common_prefix(a: &str, b: &str) -> String {
    let len = a
        .char_indices()
        .zip(b.char_indices())
        .take_while(|((_, ca), (_, cb))| ca == cb)
        .count();
    a.chars().take(len).collect()
}

/// Bottom-up DFS over the call tree: a USR region is reclassified COM if
/// any descendant's *base* group taints (ranks above COM). Grounded on
/// `calculate_calltree_types`; see spec.md §4.2 [FULL] supplement for the
/// exact ordscore semantics.
fn compute_tainted_groups(
    regions: &[Region],
    cnodes: &[CallNode],
    root_cnodes: &[CnodeId],
) -> Vec<Group> {
    let base_groups: Vec<Group> = regions.iter().map(derive_base_group).collect();
    let mut tainted = base_groups.clone();

    fn visit(
        id: CnodeId,
        cnodes: &[CallNode],
        base_groups: &[Group],
        tainted: &mut [Group],
    ) -> bool {
        let node = &cnodes[id.0 as usize];
        let own_rank = base_groups[node.region.0 as usize];
        let mut subtree_taints = own_rank.taints_usr_ancestor();
        let mut any_child_taints = false;
        for &child in &node.children {
            if visit(child, cnodes, base_groups, tainted) {
                subtree_taints = true;
                any_child_taints = true;
            }
        }
        if any_child_taints && base_groups[node.region.0 as usize] == Group::Usr {
            tainted[node.region.0 as usize] = Group::Com;
        }
        subtree_taints
    }

    for &root in root_cnodes {
        visit(root, cnodes, &base_groups, &mut tainted);
    }
    tainted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnode::CallNode;
    use crate::system::{Location, LocationGroup};

    fn region(name: &str, paradigm: &str) -> Region {
        Region {
            name: name.to_string(),
            mangled_name: name.to_string(),
            paradigm_tag: paradigm.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn com_taint_propagates_through_mpi_child() {
        let regions = vec![region("user_A", "user"), region("MPI_Send", "mpi")];
        let cnodes = vec![
            CallNode {
                region: RegionId(0),
                parent: None,
                children: vec![CnodeId(1)],
                num_params_int: 0,
                num_params_str: 0,
            },
            CallNode {
                region: RegionId(1),
                parent: Some(CnodeId(0)),
                children: vec![],
                num_params_int: 0,
                num_params_str: 0,
            },
        ];
        let tainted = compute_tainted_groups(&regions, &cnodes, &[CnodeId(0)]);
        assert_eq!(tainted[0], Group::Com);
        assert_eq!(tainted[1], Group::Mpi);
    }

    #[test]
    fn leaf_usr_region_is_not_tainted() {
        let regions = vec![region("leaf", "user")];
        let cnodes = vec![CallNode {
            region: RegionId(0),
            parent: None,
            children: vec![],
            num_params_int: 0,
            num_params_str: 0,
        }];
        let tainted = compute_tainted_groups(&regions, &cnodes, &[CnodeId(0)]);
        assert_eq!(tainted[0], Group::Usr);
    }

    #[test]
    fn accelerator_rollup_folds_into_owning_process() {
        let mut raw = RawReport::new();
        raw.regions.push(region("A", "user"));
        raw.cnodes.push(CallNode {
            region: RegionId(0),
            parent: None,
            children: vec![],
            num_params_int: 0,
            num_params_str: 0,
        });
        raw.root_cnodes.push(CnodeId(0));
        raw.system.location_groups.push(LocationGroup {
            name: "rank 0".to_string(),
            kind: LocationGroupKind::Process,
            creating_location_group: None,
            locations: vec![Location { name: "thread 0".to_string() }],
        });
        raw.system.location_groups.push(LocationGroup {
            name: "GPU 0".to_string(),
            kind: LocationGroupKind::Accelerator,
            creating_location_group: Some("rank 0".to_string()),
            locations: vec![Location { name: "stream 0".to_string() }],
        });
        raw.measurements = vec![
            vec![CallNodeMeasurement { visits: 10, time: 1.0, hits: 0 }],
            vec![CallNodeMeasurement { visits: 5, time: 0.5, hits: 0 }],
        ];
        let profile = Profile::build(raw).unwrap();
        assert_eq!(profile.number_of_processes(), 1);
        assert_eq!(profile.max_locations_per_process(), 2);
        let mut seen = Vec::new();
        profile
            .iterate_call_tree(0, |v| seen.push((v.visits, v.time)))
            .unwrap();
        assert_eq!(seen, vec![(15, 1.5)]);
    }
}
