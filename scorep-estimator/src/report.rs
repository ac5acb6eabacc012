//! Sorted tabular report (spec.md §4.5/§6), grounded on
//! `SCOREP_Score_Estimator::printGroups`/`printRegions`'s column layout:
//! a `+` sigil on already-filtered rows (preloaded filter, `-f`), a leading
//! type column, then byte/percentage/visit/time/time-per-visit columns.
use crate::core::{Estimator, SortCriterion};
use crate::score_group::{FilterMark, ScoreGroup};
use scorep_report::RegionId;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub per_region: bool,
    pub show_mangled: bool,
    pub sort: Option<SortCriterion>,
}

/// Render the score table for `estimator`. Sort is stable (spec.md §4.5):
/// descending for size/time/visits, ascending for time-per-visit and name.
pub fn format_report(estimator: &Estimator, opts: &ReportOptions) -> String {
    let mut out = String::new();
    let max_buf = estimator.max_buf().max(1);
    let total_time = estimator.total_time().max(f64::MIN_POSITIVE);

    out.push_str(&format!(
        "Estimated aggregate size of event trace:                   {} bytes\n",
        estimator.total_buf()
    ));
    out.push_str(&format!(
        "Estimated size of event trace per rank:                    {} bytes\n",
        max_buf
    ));
    match estimator.memory_requirement() {
        Some(req) => out.push_str(&format!(
            "Suggested value for SCOREP_TOTAL_MEMORY :                  {req} bytes\n\n"
        )),
        None => out.push_str(
            "WARNING: memory requirement exceeds 2^32-1 bytes; SCOREP_TOTAL_MEMORY=4G is the maximum supported value.\n\n",
        ),
    }

    out.push_str(&header_line());
    let mut groups: Vec<&ScoreGroup> = estimator.groups().values().collect();
    sort_groups(&mut groups, opts.sort);
    for g in groups {
        out.push_str(&row(g, max_buf, total_time, false, opts.show_mangled));
    }

    if let Some(filtered) = estimator.filtered_groups() {
        out.push_str("\nAfter filtering:\n");
        out.push_str(&header_line());
        let mut fgroups: Vec<&ScoreGroup> = filtered.values().collect();
        sort_groups(&mut fgroups, opts.sort);
        for g in fgroups {
            out.push_str(&row(g, max_buf, total_time, false, opts.show_mangled));
        }
        if let Some(flt) = estimator.filtered_flt() {
            out.push_str(&row(flt, max_buf, total_time, false, opts.show_mangled));
        }
    }

    if opts.per_region {
        if let Some(regions) = estimator.regions() {
            out.push_str("\nPer-region breakdown:\n");
            out.push_str(&header_line());
            let mut rows: Vec<(RegionId, &ScoreGroup)> =
                regions.iter().map(|(id, sg)| (*id, sg)).collect();
            rows.sort_by(|a, b| compare(a.1, b.1, opts.sort));
            for (region, sg) in rows {
                let sigil = estimator.region_is_filtered(region) || sg.filter_mark == FilterMark::Excluded;
                out.push_str(&row(sg, max_buf, total_time, sigil, opts.show_mangled));
            }
        }
    }

    out
}

fn header_line() -> String {
    format!(
        "{:>3} {:>14} {:>8} {:>12} {:>10} {:>8} {:>14}  {}\n",
        "flt", "max_buf[B]", "max_buf%", "visits", "time[s]", "time%", "time/visit[us]", "region"
    )
}

fn row(g: &ScoreGroup, max_buf: u64, total_time: f64, force_sigil: bool, show_mangled: bool) -> String {
    let sigil = if force_sigil || g.filter_mark == FilterMark::Excluded {
        "+"
    } else {
        ""
    };
    let pct = g.max_buf() as f64 / max_buf as f64 * 100.0;
    let time_pct = g.total_time / total_time * 100.0;
    let name = if show_mangled && !g.mangled_name.is_empty() {
        &g.mangled_name
    } else {
        &g.name
    };
    format!(
        "{:>3} {:>14} {:>7.2}% {:>12} {:>10.6} {:>7.2}% {:>14.3}  {}\n",
        sigil,
        g.max_buf(),
        pct,
        g.total_visits,
        g.total_time,
        time_pct,
        g.time_per_visit_us(),
        name
    )
}

fn sort_groups(groups: &mut [&ScoreGroup], sort: Option<SortCriterion>) {
    groups.sort_by(|a, b| compare(a, b, sort));
}

fn compare(a: &ScoreGroup, b: &ScoreGroup, sort: Option<SortCriterion>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match sort.unwrap_or(SortCriterion::MaxBuffer) {
        SortCriterion::MaxBuffer => b.max_buf().cmp(&a.max_buf()),
        SortCriterion::TotalTime => b
            .total_time
            .partial_cmp(&a.total_time)
            .unwrap_or(Ordering::Equal),
        SortCriterion::Visits => b.total_visits.cmp(&a.total_visits),
        SortCriterion::TimePerVisit => a
            .time_per_visit_us()
            .partial_cmp(&b.time_per_visit_us())
            .unwrap_or(Ordering::Equal),
        SortCriterion::Name => a.name.cmp(&b.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Estimator;
    use scorep_oracle::EventSizeOracle;
    use scorep_report::{CallNode, CallNodeMeasurement, CnodeId, Location, LocationGroup, LocationGroupKind, RawReport, Region, RegionId};

    fn oracle() -> EventSizeOracle {
        EventSizeOracle::from_table([
            ("Timestamp".to_string(), 8u64),
            ("Enter".to_string(), 60u64),
            ("Leave".to_string(), 60u64),
            ("ParameterInt".to_string(), 12u64),
            ("ParameterString".to_string(), 12u64),
            ("CallingContextSample".to_string(), 20u64),
        ])
    }

    #[test]
    fn report_renders_without_panicking() {
        let mut raw = RawReport::new();
        raw.regions.push(Region {
            name: "A".to_string(),
            mangled_name: "A_mangled".to_string(),
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
        raw.measurements = vec![vec![CallNodeMeasurement { visits: 10, time: 1.0, hits: 0 }]];
        let profile = scorep_report::Profile::build(raw).unwrap();
        let oracle = oracle();
        let mut est = Estimator::new(profile, &oracle, 0, true, None).unwrap();
        est.run().unwrap();
        let text = format_report(&est, &ReportOptions::default());
        assert!(text.contains("USR"));
        assert!(text.contains("ALL"));
    }
}
