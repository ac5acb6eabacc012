//! Estimator core (spec.md §4.5), grounded on `SCOREP_Score_Estimator`'s
//! constructor and `calculateCost` walk. Construction resolves
//! `bytesPerVisit` for every region once; [`Estimator::run`] then performs
//! the per-process/per-call-node credit walk described in spec.md §4.5's
//! pseudocode, optionally evaluating a preloaded filter alongside it.
use rustc_hash::FxHashMap;
use scorep_filter::FilterFile;
use scorep_oracle::EventSizeOracle;
use scorep_report::{default_posture, CnodeVisit, Group, Profile, RegionId};

use crate::catalogue::Catalogue;
use crate::error::EstimatorError;
use crate::score_group::ScoreGroup;

pub const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortCriterion {
    MaxBuffer,
    TotalTime,
    TimePerVisit,
    Visits,
    Name,
}

impl SortCriterion {
    pub fn parse(s: &str) -> Option<SortCriterion> {
        match s {
            "maxbuffer" => Some(SortCriterion::MaxBuffer),
            "totaltime" => Some(SortCriterion::TotalTime),
            "timepervisit" => Some(SortCriterion::TimePerVisit),
            "visits" => Some(SortCriterion::Visits),
            "name" => Some(SortCriterion::Name),
            _ => None,
        }
    }
}

pub struct Estimator {
    profile: Profile,
    catalogue: Catalogue,
    bytes_per_visit: Vec<u64>,
    groups: FxHashMap<Group, ScoreGroup>,
    regions: Option<FxHashMap<RegionId, ScoreGroup>>,
    filter: Option<FilterFile>,
    filtered_groups: Option<FxHashMap<Group, ScoreGroup>>,
    filtered_flt: Option<ScoreGroup>,
    region_filter_marks: FxHashMap<RegionId, bool>,
    max_buf: u64,
    total_buf: u64,
    total_time: f64,
}

impl Estimator {
    /// Populates the oracle, registers the catalogue, resolves
    /// `bytesPerVisit` for every region, and allocates the group (and,
    /// optionally, per-region) accumulators — `SCOREP_Score_Estimator`'s
    /// constructor.
    pub fn new(
        profile: Profile,
        oracle: &EventSizeOracle,
        num_dense: u64,
        per_region: bool,
        filter: Option<FilterFile>,
    ) -> Result<Estimator, EstimatorError> {
        let catalogue = Catalogue::build(oracle, &profile, num_dense)?;
        let num_regions = profile.number_of_regions();
        let mut bytes_per_visit = Vec::with_capacity(num_regions);
        for idx in 0..num_regions {
            bytes_per_visit.push(catalogue.bytes_per_visit(&profile, RegionId(idx as u32))?);
        }

        let num_processes = profile.number_of_processes();
        let mut groups = FxHashMap::default();
        groups.insert(Group::All, ScoreGroup::new(num_processes, Group::All.short_name()));
        for &g in &Group::ALL_BUT_ALL {
            groups.insert(g, ScoreGroup::new(num_processes, g.short_name()));
        }

        let regions = per_region.then(|| {
            let mut map = FxHashMap::default();
            for idx in 0..num_regions {
                let rid = RegionId(idx as u32);
                let region = profile.region(rid).expect("region id in range");
                let mut sg = ScoreGroup::new(num_processes, region.name.clone());
                sg.mangled_name = region.mangled_name.clone();
                sg.file_name = region.file.clone();
                map.insert(rid, sg);
            }
            map
        });

        let filtered_groups = filter.is_some().then(|| {
            let mut map = FxHashMap::default();
            map.insert(Group::All, ScoreGroup::new(num_processes, Group::All.short_name()));
            for &g in &Group::ALL_BUT_ALL {
                map.insert(g, ScoreGroup::new(num_processes, g.short_name()));
            }
            map
        });
        let filtered_flt = filter.is_some().then(|| ScoreGroup::new(num_processes, "FLT"));

        Ok(Estimator {
            profile,
            catalogue,
            bytes_per_visit,
            groups,
            regions,
            filter,
            filtered_groups,
            filtered_flt,
            region_filter_marks: FxHashMap::default(),
            max_buf: 0,
            total_buf: 0,
            total_time: 0.0,
        })
    }

    /// Runs the per-process call-tree walk exactly as laid out in spec.md
    /// §4.5, crediting every process's byte/visit/hit/time totals into the
    /// group buckets (and, if filtering, into the filtered buckets too).
    pub fn run(&mut self) -> Result<(), EstimatorError> {
        let timestamp = self.catalogue.timestamp_size();

        for process in 0..self.profile.number_of_processes() {
            let mut pending: Vec<CnodeVisit> = Vec::new();
            self.profile.iterate_call_tree(process, |visit| pending.push(visit))?;
            for visit in pending {
                self.credit_visit(process, &visit, timestamp)?;
            }
        }

        self.max_buf = self
            .groups
            .get(&Group::All)
            .map(ScoreGroup::max_buf)
            .unwrap_or(0);
        let all = self.groups.get(&Group::All);
        self.total_buf = all.map(|g| g.total_bytes).unwrap_or(0);
        self.total_time = all.map(|g| g.total_time).unwrap_or(0.0);
        Ok(())
    }

    fn credit_visit(
        &mut self,
        process: usize,
        visit: &CnodeVisit,
        timestamp_size: u64,
    ) -> Result<(), EstimatorError> {
        if visit.visits == 0 && visit.hits == 0 {
            return Ok(());
        }

        let region = self.profile.region(visit.region)?;
        let is_dynamic = region.is_dynamic();

        if is_dynamic {
            if let Some(parent_region) = visit.parent_region {
                let parent_bytes_per_visit = self.bytes_per_visit[parent_region.0 as usize];
                let bytes = visit.visits * parent_bytes_per_visit;
                let group = self.profile.group(visit.region)?;
                self.credit_group(group, process, bytes, visit.visits, 0, visit.time);
                if let Some(regions) = &mut self.regions {
                    if let Some(sg) = regions.get_mut(&parent_region) {
                        sg.credit(process, bytes, visit.visits, 0, visit.time);
                    }
                }
                return Ok(());
            }
        }

        let oracle_size = |name: &str| -> Result<u64, EstimatorError> {
            Ok(self.catalogue.bytes_per_visit_component_size(name)?)
        };
        let param_int_cost = oracle_size("ParameterInt")? + timestamp_size;
        let param_str_cost = oracle_size("ParameterString")? + timestamp_size;
        let hit_cost = oracle_size("CallingContextSample")? + timestamp_size;

        let bytes = visit.visits
            * (self.bytes_per_visit[visit.region.0 as usize]
                + visit.num_params_int as u64 * param_int_cost
                + visit.num_params_str as u64 * param_str_cost)
            + visit.hits * hit_cost;

        let group = self.profile.group(visit.region)?;
        self.credit_group(group, process, bytes, visit.visits, visit.hits, visit.time);
        if let Some(regions) = &mut self.regions {
            if let Some(sg) = regions.get_mut(&visit.region) {
                sg.credit(process, bytes, visit.visits, visit.hits, visit.time);
            }
        }

        if let Some(filter) = &self.filter {
            let file_name = region.file.as_str();
            let region_name = region.name.as_str();
            let mangled_name = region.mangled_name.as_str();
            let posture = default_posture(group);
            let filtered =
                filter.filters_out(file_name, region_name, mangled_name, &region.paradigm(), posture);
            self.region_filter_marks.insert(visit.region, filtered);
            if let Some(regions) = &mut self.regions {
                if let Some(sg) = regions.get_mut(&visit.region) {
                    sg.mark_filter(filtered);
                }
            }
            if filtered {
                if let Some(flt) = &mut self.filtered_flt {
                    flt.credit(process, bytes, visit.visits, visit.hits, visit.time);
                }
            } else if let Some(filtered_groups) = &mut self.filtered_groups {
                if let Some(all) = filtered_groups.get_mut(&Group::All) {
                    all.credit(process, bytes, visit.visits, visit.hits, visit.time);
                }
                if let Some(sg) = filtered_groups.get_mut(&group) {
                    sg.credit(process, bytes, visit.visits, visit.hits, visit.time);
                }
            }
        }

        Ok(())
    }

    fn credit_group(&mut self, group: Group, process: usize, bytes: u64, visits: u64, hits: u64, time: f64) {
        if let Some(all) = self.groups.get_mut(&Group::All) {
            all.credit(process, bytes, visits, hits, time);
        }
        if let Some(sg) = self.groups.get_mut(&group) {
            sg.credit(process, bytes, visits, hits, time);
        }
    }

    pub fn groups(&self) -> &FxHashMap<Group, ScoreGroup> {
        &self.groups
    }

    pub fn filtered_groups(&self) -> Option<&FxHashMap<Group, ScoreGroup>> {
        self.filtered_groups.as_ref()
    }

    pub fn filtered_flt(&self) -> Option<&ScoreGroup> {
        self.filtered_flt.as_ref()
    }

    pub fn regions(&self) -> Option<&FxHashMap<RegionId, ScoreGroup>> {
        self.regions.as_ref()
    }

    pub fn region_is_filtered(&self, r: RegionId) -> bool {
        self.region_filter_marks.get(&r).copied().unwrap_or(false)
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn max_buf(&self) -> u64 {
        self.max_buf
    }

    pub fn total_buf(&self) -> u64 {
        self.total_buf
    }

    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// `max(max_buf, 2 MiB) + 2 MiB * maxLocationsPerProcess` (spec.md
    /// §4.5). Returns `None` when the requirement overflows a 32-bit byte
    /// count, in which case the caller should warn and clamp the
    /// suggestion to `SCOREP_TOTAL_MEMORY=4G`.
    pub fn memory_requirement(&self) -> Option<u64> {
        let base = self.max_buf.max(2 * MIB);
        let per_location = 2 * MIB * self.profile.max_locations_per_process() as u64;
        base.checked_add(per_location)
            .filter(|&total| total <= u32::MAX as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorep_oracle::EventSizeOracle;
    use scorep_report::{CallNode, CnodeId, Location, LocationGroup, LocationGroupKind, RawReport, Region};

    fn oracle() -> EventSizeOracle {
        EventSizeOracle::from_table([
            ("Timestamp".to_string(), 8u64),
            ("Enter".to_string(), 60u64),
            ("Leave".to_string(), 60u64),
            ("ParameterInt".to_string(), 12u64),
            ("ParameterString".to_string(), 12u64),
            ("CallingContextSample".to_string(), 20u64),
            ("CallingContextEnter".to_string(), 40u64),
            ("CallingContextLeave".to_string(), 10u64),
            ("Metric".to_string(), 16u64),
        ])
    }

    fn minimal_profile() -> Profile {
        let mut raw = RawReport::new();
        raw.regions.push(Region {
            name: "A".to_string(),
            mangled_name: "A".to_string(),
            paradigm_tag: "user".to_string(),
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
        raw.system.location_groups.push(LocationGroup {
            name: "rank 0".to_string(),
            kind: LocationGroupKind::Process,
            creating_location_group: None,
            locations: vec![Location { name: "thread 0".to_string() }],
        });
        raw.measurements = vec![vec![scorep_report::CallNodeMeasurement {
            visits: 10,
            time: 1.0,
            hits: 0,
        }]];
        Profile::build(raw).unwrap()
    }

    #[test]
    fn minimal_visit_accounting_matches_scenario_one() {
        let profile = minimal_profile();
        let oracle = oracle();
        let mut est = Estimator::new(profile, &oracle, 0, false, None).unwrap();
        est.run().unwrap();
        let usr = &est.groups()[&Group::Usr];
        assert_eq!(usr.total_bytes, 1360);
        let all = &est.groups()[&Group::All];
        assert_eq!(all.total_bytes, 1360);
        assert_eq!(est.max_buf(), 1360);
        assert!((est.total_time() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_visits_and_hits_contribute_nothing() {
        let mut raw = RawReport::new();
        raw.regions.push(Region {
            name: "A".to_string(),
            mangled_name: "A".to_string(),
            paradigm_tag: "user".to_string(),
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
        raw.system.location_groups.push(LocationGroup {
            name: "rank 0".to_string(),
            kind: LocationGroupKind::Process,
            creating_location_group: None,
            locations: vec![],
        });
        raw.measurements = vec![vec![scorep_report::CallNodeMeasurement::default()]];
        let profile = Profile::build(raw).unwrap();
        let oracle = oracle();
        let mut est = Estimator::new(profile, &oracle, 0, false, None).unwrap();
        est.run().unwrap();
        assert_eq!(est.total_buf(), 0);
    }

    #[test]
    fn memory_requirement_uses_two_mib_floor() {
        let profile = minimal_profile();
        let oracle = oracle();
        let mut est = Estimator::new(profile, &oracle, 0, false, None).unwrap();
        est.run().unwrap();
        assert_eq!(est.memory_requirement().unwrap(), 2 * MIB + 2 * MIB);
    }

    /// Scenario 4 (`user_A -> MPI_Send`): a call tree deeper than one node
    /// must still sum every credited node's time into `total_time`, not
    /// just the root's.
    #[test]
    fn total_time_sums_every_node_not_just_the_root() {
        let mut raw = RawReport::new();
        raw.regions.push(Region {
            name: "user_A".to_string(),
            mangled_name: "user_A".to_string(),
            paradigm_tag: "user".to_string(),
            ..Default::default()
        });
        raw.regions.push(Region {
            name: "MPI_Send".to_string(),
            mangled_name: "MPI_Send".to_string(),
            paradigm_tag: "mpi".to_string(),
            ..Default::default()
        });
        raw.cnodes.push(CallNode {
            region: RegionId(0),
            parent: None,
            children: vec![CnodeId(1)],
            num_params_int: 0,
            num_params_str: 0,
        });
        raw.cnodes.push(CallNode {
            region: RegionId(1),
            parent: Some(CnodeId(0)),
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
        raw.measurements = vec![vec![
            scorep_report::CallNodeMeasurement { visits: 10, time: 1.0, hits: 0 },
            scorep_report::CallNodeMeasurement { visits: 5, time: 0.5, hits: 0 },
        ]];
        let profile = Profile::build(raw).unwrap();
        let oracle = oracle();
        let mut est = Estimator::new(profile, &oracle, 0, false, None).unwrap();
        est.run().unwrap();
        assert!((est.total_time() - 1.5).abs() < 1e-9);
    }
}
