//! Filter-file generation (spec.md §4.5/§6), grounded on
//! `SCOREP_Score_Estimator::generate_filter_file` and
//! `SCOREP_Score_Group::cleanName`'s meta-character escaping.
use std::io::Write as _;
use std::path::{Path, PathBuf};

use scorep_report::{Group, RegionId};

use crate::core::{Estimator, MIB};
use crate::error::EstimatorError;
use crate::score_group::{FilterMark, ScoreGroup};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    Usr,
    Com,
    Both,
}

impl FilterType {
    pub fn parse(s: &str) -> Option<FilterType> {
        match s {
            "usr" => Some(FilterType::Usr),
            "com" => Some(FilterType::Com),
            "both" => Some(FilterType::Both),
            _ => None,
        }
    }

    fn matches(self, group: Group) -> bool {
        match self {
            FilterType::Usr => group == Group::Usr,
            FilterType::Com => group == Group::Com,
            FilterType::Both => matches!(group, Group::Usr | Group::Com),
        }
    }
}

/// `-g[=bufferpercent=...,timepervisit=...,visits=...,bufferabsolute=...,type=...]`,
/// defaulting to `1,1,0,0,usr` (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterGenOptions {
    pub buffer_percent: f64,
    pub time_per_visit_us: f64,
    pub min_visits: u64,
    pub buffer_absolute_mib: f64,
    pub filter_type: FilterType,
}

impl Default for FilterGenOptions {
    fn default() -> FilterGenOptions {
        FilterGenOptions {
            buffer_percent: 1.0,
            time_per_visit_us: 1.0,
            min_visits: 0,
            buffer_absolute_mib: 0.0,
            filter_type: FilterType::Usr,
        }
    }
}

/// One selected candidate, ready to be rendered into a filter-file block.
struct Candidate {
    region: RegionId,
    name: String,
    mangled_name: String,
    file_name: String,
    group: Group,
    max_buf: u64,
    visits: u64,
    time: f64,
    time_pct: f64,
}

/// Selects every region meeting spec.md §4.5's filter-candidate threshold
/// and renders the `SCOREP_REGION_NAMES_BEGIN`/`EXCLUDE` block, appending a
/// preloaded filter's entries (verbatim text) under the banner from
/// spec.md §6 when `preloaded_text` is given.
pub fn generate_filter_file(
    estimator: &Estimator,
    opts: &FilterGenOptions,
    preloaded_text: Option<&str>,
) -> Result<String, EstimatorError> {
    let regions = estimator
        .regions()
        .ok_or(EstimatorError::FilterFileWrite {
            path: String::new(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "filter-file generation requires per-region accounting (-r)",
            ),
        })?;
    let max_buf = estimator.max_buf().max(1) as f64;
    let total_time = estimator.total_time().max(f64::MIN_POSITIVE);
    let min_buf_abs = (opts.buffer_absolute_mib * MIB as f64) as u64;

    let mut candidates: Vec<Candidate> = Vec::new();
    for (&region_id, sg) in regions.iter() {
        let group = match estimator.profile().group(region_id) {
            Ok(g) => g,
            Err(_) => continue,
        };
        if !opts.filter_type.matches(group) {
            continue;
        }
        if sg.filter_mark == FilterMark::Excluded {
            continue;
        }
        let ratio_pct = sg.max_buf() as f64 / max_buf * 100.0;
        if ratio_pct < opts.buffer_percent {
            continue;
        }
        if sg.time_per_visit_us() > opts.time_per_visit_us {
            continue;
        }
        if sg.total_visits < opts.min_visits {
            continue;
        }
        if sg.max_buf() < min_buf_abs {
            continue;
        }
        candidates.push(Candidate {
            region: region_id,
            name: sg.name.clone(),
            mangled_name: sg.mangled_name.clone(),
            file_name: sg.file_name.clone(),
            group,
            max_buf: sg.max_buf(),
            visits: sg.total_visits,
            time: sg.total_time,
            time_pct: sg.total_time / total_time * 100.0,
        });
    }
    candidates.sort_by(|a, b| b.max_buf.cmp(&a.max_buf).then_with(|| a.region.0.cmp(&b.region.0)));

    let mut out = String::new();
    out.push_str("SCOREP_REGION_NAMES_BEGIN\n");
    out.push_str("  EXCLUDE\n");
    for c in &candidates {
        out.push_str(&format!(
            "    # {} {}, max_buf: {} B ({:.2}%)\n",
            c.group.short_name(),
            c.name,
            c.max_buf,
            c.max_buf as f64 / max_buf * 100.0
        ));
        out.push_str(&format!(
            "    # visits: {}, time: {:.6}s ({:.2}%), time/visit: {:.3}us\n",
            c.visits, c.time, c.time_pct, time_per_visit_us(c.time, c.visits)
        ));
        out.push_str(&format!("    # file: {}\n", c.file_name));
        out.push_str(&format!("    MANGLED {}\n", escape_fnmatch(&c.mangled_name)));
    }
    out.push_str("SCOREP_REGION_NAMES_END\n");

    if let Some(preloaded) = preloaded_text {
        out.push_str("\n# Regions directly included from filter file provided by -f:\n");
        out.push_str(preloaded.trim_end());
        out.push('\n');
    }

    Ok(out)
}

fn time_per_visit_us(time: f64, visits: u64) -> f64 {
    if visits == 0 {
        0.0
    } else {
        time / visits as f64 * 1_000_000.0
    }
}

/// Escape the four fnmatch meta-characters `SCOREP_Score_Group::cleanName`
/// escapes when generating `MANGLED` lines: space, `]`, `[`, `*`, `!`.
pub fn escape_fnmatch(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, ' ' | ']' | '[' | '*' | '!') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Writes `content` to `path`, refusing to silently overwrite an existing
/// file: any pre-existing file is renamed aside to a deterministic backup
/// suffix (`<name>.bak`, then `<name>.bak.1`, `<name>.bak.2`, ...) and the
/// move is reported through the returned `Option<PathBuf>` (spec.md §4.5).
pub fn write_filter_file(path: &Path, content: &str) -> Result<Option<PathBuf>, EstimatorError> {
    let backup = if path.exists() {
        let backup_path = next_backup_path(path);
        std::fs::rename(path, &backup_path).map_err(|source| EstimatorError::FilterFileWrite {
            path: path.display().to_string(),
            source,
        })?;
        Some(backup_path)
    } else {
        None
    };

    let mut file = std::fs::File::create(path).map_err(|source| EstimatorError::FilterFileWrite {
        path: path.display().to_string(),
        source,
    })?;
    file.write_all(content.as_bytes())
        .map_err(|source| EstimatorError::FilterFileWrite {
            path: path.display().to_string(),
            source,
        })?;
    Ok(backup)
}

fn next_backup_path(path: &Path) -> PathBuf {
    let first = path.with_extension(match path.extension() {
        Some(ext) => format!("{}.bak", ext.to_string_lossy()),
        None => "bak".to_string(),
    });
    if !first.exists() {
        return first;
    }
    let mut n = 1u32;
    loop {
        let candidate = PathBuf::from(format!("{}.{n}", first.display()));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_meta_characters() {
        assert_eq!(escape_fnmatch("foo bar"), "foo\\ bar");
        assert_eq!(escape_fnmatch("a[b]c*d!"), "a\\[b\\]c\\*d\\!");
    }

    #[test]
    fn backup_path_increments_on_collision() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("initial_scorep.filter");
        std::fs::write(&path, "old").unwrap();
        std::fs::write(path.with_extension("filter.bak"), "older").unwrap();
        let backup = next_backup_path(&path);
        assert_eq!(backup, path.with_extension("filter.bak.1"));
    }

    #[test]
    fn write_filter_file_backs_up_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("initial_scorep.filter");
        std::fs::write(&path, "old content").unwrap();
        let backup = write_filter_file(&path, "new content").unwrap();
        assert!(backup.is_some());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new content");
        assert_eq!(std::fs::read_to_string(backup.unwrap()).unwrap(), "old content");
    }
}
