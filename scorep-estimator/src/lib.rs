//! Trace-cost estimator (spec.md §4.4–§4.6): the event contributor
//! catalogue, the per-process/per-region credit walk, the score-group
//! accumulators, the sorted tabular report, and filter-file generation.
//! See `scorep-score` (src/bin/scorep_score.rs) for the CLI entry point.

mod catalogue;
mod core;
mod error;
mod filter_gen;
mod profile_io;
mod report;
mod score_group;

pub use catalogue::Catalogue;
pub use core::{Estimator, SortCriterion, MIB};
pub use error::EstimatorError;
pub use filter_gen::{generate_filter_file, write_filter_file, FilterGenOptions, FilterType};
pub use profile_io::load_profile;
pub use report::{format_report, ReportOptions};
pub use score_group::{FilterMark, ScoreGroup};
