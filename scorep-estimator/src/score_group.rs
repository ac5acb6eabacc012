//! Per-group-or-region accumulator (spec.md §3's "Score group"), grounded on
//! `SCOREP_Score_Group`: a per-process byte counter array plus running
//! totals, optional name/file/mangled-name metadata for the per-region
//! variant, and a three-state filter mark used by the `-f` sigil and by
//! filter-file generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMark {
    Unmarked,
    Included,
    Excluded,
}

#[derive(Debug, Clone)]
pub struct ScoreGroup {
    pub name: String,
    pub mangled_name: String,
    pub file_name: String,
    per_process_bytes: Vec<u64>,
    pub total_bytes: u64,
    pub total_visits: u64,
    pub total_hits: u64,
    pub total_time: f64,
    pub filter_mark: FilterMark,
}

impl ScoreGroup {
    pub fn new(num_processes: usize, name: impl Into<String>) -> ScoreGroup {
        ScoreGroup {
            name: name.into(),
            mangled_name: String::new(),
            file_name: String::new(),
            per_process_bytes: vec![0; num_processes],
            total_bytes: 0,
            total_visits: 0,
            total_hits: 0,
            total_time: 0.0,
            filter_mark: FilterMark::Unmarked,
        }
    }

    pub fn credit(&mut self, process: usize, bytes: u64, visits: u64, hits: u64, time: f64) {
        self.per_process_bytes[process] += bytes;
        self.total_bytes += bytes;
        self.total_visits += visits;
        self.total_hits += hits;
        self.total_time += time;
    }

    pub fn max_buf(&self) -> u64 {
        self.per_process_bytes.iter().copied().max().unwrap_or(0)
    }

    pub fn bytes_on_process(&self, process: usize) -> u64 {
        self.per_process_bytes.get(process).copied().unwrap_or(0)
    }

    pub fn time_per_visit_us(&self) -> f64 {
        if self.total_visits == 0 {
            0.0
        } else {
            self.total_time / self.total_visits as f64 * 1_000_000.0
        }
    }

    pub fn mark_filter(&mut self, excluded: bool) {
        self.filter_mark = if excluded {
            FilterMark::Excluded
        } else {
            FilterMark::Included
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_accumulates_per_process_and_totals() {
        let mut g = ScoreGroup::new(2, "USR");
        g.credit(0, 100, 5, 0, 0.5);
        g.credit(1, 40, 2, 0, 0.1);
        assert_eq!(g.bytes_on_process(0), 100);
        assert_eq!(g.bytes_on_process(1), 40);
        assert_eq!(g.max_buf(), 100);
        assert_eq!(g.total_bytes, 140);
        assert_eq!(g.total_visits, 7);
        assert!((g.total_time - 0.6).abs() < 1e-9);
    }

    #[test]
    fn time_per_visit_is_zero_with_no_visits() {
        let g = ScoreGroup::new(1, "X");
        assert_eq!(g.time_per_visit_us(), 0.0);
    }
}
