//! Filter engine (spec.md §4.6): parses a Cube-style region filter file
//! (shell-glob include/exclude rules on file name, region name, and
//! mangled name) and evaluates `match(file, region, mangled)` against it.
//!
//! The file grammar is the one Score-P/Cube tooling has always used:
//! a `SCOREP_REGION_NAMES_BEGIN`/`_END` block with nested `EXCLUDE`/
//! `INCLUDE` sections (region-name patterns, or `MANGLED <pattern>` lines
//! for mangled-name patterns), and an optional `SCOREP_FILE_NAMES_BEGIN`/
//! `_END` block of file-name patterns. `INCLUDE` always wins over
//! `EXCLUDE` for the same name, matching the original's "include takes
//! precedence" semantics. Patterns are shell-glob (`glob::Pattern`), which
//! already treats a leading `\` as an escape for its own meta-characters —
//! the same four spec.md §4.5 calls out (`MANGLED <escaped-name>`
//! generation escapes space, `]`, `[`, `*`, `!`).
mod error;

pub use error::FilterParseError;
use glob::Pattern;
use scorep_report::{FilterPosture, Paradigm};

#[derive(Debug, Default)]
struct PatternSet {
    exclude: Vec<Pattern>,
    include: Vec<Pattern>,
}

impl PatternSet {
    fn excludes(&self, value: &str) -> bool {
        let is_excluded = self.exclude.iter().any(|p| p.matches(value));
        if !is_excluded {
            return false;
        }
        !self.include.iter().any(|p| p.matches(value))
    }
}

#[derive(Debug, Default)]
pub struct FilterFile {
    region_names: PatternSet,
    mangled_names: PatternSet,
    file_names: PatternSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    RegionExclude,
    RegionInclude,
    FileExclude,
    FileInclude,
}

impl FilterFile {
    /// Parse the textual filter file format described above.
    pub fn parse(text: &str) -> Result<FilterFile, FilterParseError> {
        let mut filter = FilterFile::default();
        let mut in_region_block = false;
        let mut in_file_block = false;
        let mut section = Section::None;

        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line {
                "SCOREP_REGION_NAMES_BEGIN" => {
                    in_region_block = true;
                    section = Section::None;
                    continue;
                }
                "SCOREP_REGION_NAMES_END" => {
                    in_region_block = false;
                    continue;
                }
                "SCOREP_FILE_NAMES_BEGIN" => {
                    in_file_block = true;
                    section = Section::None;
                    continue;
                }
                "SCOREP_FILE_NAMES_END" => {
                    in_file_block = false;
                    continue;
                }
                "EXCLUDE" if in_region_block => {
                    section = Section::RegionExclude;
                    continue;
                }
                "INCLUDE" if in_region_block => {
                    section = Section::RegionInclude;
                    continue;
                }
                "EXCLUDE" if in_file_block => {
                    section = Section::FileExclude;
                    continue;
                }
                "INCLUDE" if in_file_block => {
                    section = Section::FileInclude;
                    continue;
                }
                _ => {}
            }

            let (target_set, raw_pattern) = match section {
                Section::None => continue,
                Section::RegionExclude => {
                    if let Some(p) = line.strip_prefix("MANGLED ") {
                        (&mut filter.mangled_names.exclude, p)
                    } else {
                        (&mut filter.region_names.exclude, line)
                    }
                }
                Section::RegionInclude => {
                    if let Some(p) = line.strip_prefix("MANGLED ") {
                        (&mut filter.mangled_names.include, p)
                    } else {
                        (&mut filter.region_names.include, line)
                    }
                }
                Section::FileExclude => (&mut filter.file_names.exclude, line),
                Section::FileInclude => (&mut filter.file_names.include, line),
            };
            let pattern = Pattern::new(raw_pattern).map_err(|source| FilterParseError::BadPattern {
                pattern: raw_pattern.to_string(),
                source,
            })?;
            target_set.push(pattern);
        }
        Ok(filter)
    }

    /// `true` iff any of the file/region/mangled-name rules, taking
    /// `INCLUDE` precedence into account, exclude this region — spec.md
    /// §4.6's `match(fileName, regionName, mangledName)`.
    pub fn matches(&self, file_name: &str, region_name: &str, mangled_name: &str) -> bool {
        self.region_names.excludes(region_name)
            || self.mangled_names.excludes(mangled_name)
            || self.file_names.excludes(file_name)
    }

    /// `true` iff the region is actually filtered out of the trace, per
    /// spec.md §4.6: matched by the engine, not paradigm `sampling`, and
    /// the owning group's filter posture is not `NO`.
    pub fn filters_out(
        &self,
        file_name: &str,
        region_name: &str,
        mangled_name: &str,
        paradigm: &Paradigm,
        posture: FilterPosture,
    ) -> bool {
        !matches!(paradigm, Paradigm::Sampling)
            && posture != FilterPosture::No
            && self.matches(file_name, region_name, mangled_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclude_region_by_name() {
        let f = FilterFile::parse(
            "SCOREP_REGION_NAMES_BEGIN\n  EXCLUDE\n    foo_*\nSCOREP_REGION_NAMES_END\n",
        )
        .unwrap();
        assert!(f.matches("a.c", "foo_bar", "foo_bar"));
        assert!(!f.matches("a.c", "baz", "baz"));
    }

    #[test]
    fn include_overrides_exclude() {
        let f = FilterFile::parse(
            "SCOREP_REGION_NAMES_BEGIN\n  EXCLUDE\n    foo_*\n  INCLUDE\n    foo_keep\nSCOREP_REGION_NAMES_END\n",
        )
        .unwrap();
        assert!(f.matches("a.c", "foo_bar", "foo_bar"));
        assert!(!f.matches("a.c", "foo_keep", "foo_keep"));
    }

    #[test]
    fn mangled_lines_match_mangled_name_only() {
        let f = FilterFile::parse(
            "SCOREP_REGION_NAMES_BEGIN\n  EXCLUDE\n    MANGLED _ZN3foo3barE\nSCOREP_REGION_NAMES_END\n",
        )
        .unwrap();
        assert!(f.matches("a.c", "bar", "_ZN3foo3barE"));
        assert!(!f.matches("a.c", "_ZN3foo3barE", "other"));
    }

    #[test]
    fn sampling_paradigm_is_never_filtered() {
        let f = FilterFile::parse(
            "SCOREP_REGION_NAMES_BEGIN\n  EXCLUDE\n    *\nSCOREP_REGION_NAMES_END\n",
        )
        .unwrap();
        assert!(!f.filters_out("a.c", "anything", "anything", &Paradigm::Sampling, FilterPosture::Possible));
        assert!(f.filters_out("a.c", "anything", "anything", &Paradigm::User, FilterPosture::Possible));
    }

    #[test]
    fn no_posture_group_is_never_filtered() {
        let f = FilterFile::parse(
            "SCOREP_REGION_NAMES_BEGIN\n  EXCLUDE\n    *\nSCOREP_REGION_NAMES_END\n",
        )
        .unwrap();
        assert!(!f.filters_out("a.c", "anything", "anything", &Paradigm::Measurement, FilterPosture::No));
    }
}
