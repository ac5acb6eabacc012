//! `scorep-score`: the estimator CLI (spec.md §6), grounded on
//! `scorep_score.cpp`'s argument grammar. Parsing itself is modernized to
//! `clap`, following `samply/src/cli.rs`'s `Opt`/`*Args` split; the
//! grammar — flags, defaults, "profile path is the last positional
//! argument" — is unchanged.
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use scorep_estimator::{
    format_report, generate_filter_file, load_profile, write_filter_file, Estimator,
    EstimatorError, FilterGenOptions, FilterType, ReportOptions, SortCriterion,
};
use scorep_filter::FilterFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SortArg {
    #[value(name = "totaltime")]
    TotalTime,
    #[value(name = "timepervisit")]
    TimePerVisit,
    #[value(name = "maxbuffer")]
    MaxBuffer,
    #[value(name = "visits")]
    Visits,
    #[value(name = "name")]
    Name,
}

impl From<SortArg> for SortCriterion {
    fn from(s: SortArg) -> SortCriterion {
        match s {
            SortArg::TotalTime => SortCriterion::TotalTime,
            SortArg::TimePerVisit => SortCriterion::TimePerVisit,
            SortArg::MaxBuffer => SortCriterion::MaxBuffer,
            SortArg::Visits => SortCriterion::Visits,
            SortArg::Name => SortCriterion::Name,
        }
    }
}

/// Estimate the trace-buffer cost of an instrumented application from its
/// profile, and optionally generate a region filter file.
#[derive(Debug, Parser)]
#[command(name = "scorep-score", version, about)]
struct Opt {
    /// Print a per-region breakdown in addition to the per-group summary.
    #[arg(short = 'r')]
    per_region: bool,

    /// Preload a filter file; regions it already excludes are marked `+`.
    #[arg(short = 'f', value_name = "FILE")]
    filter: Option<PathBuf>,

    /// Number of dense hardware-counter metrics to count.
    #[arg(short = 'c', default_value_t = 0)]
    dense_metrics: u64,

    /// Display mangled names instead of region names.
    #[arg(short = 'm')]
    mangled: bool,

    /// Sort criterion for the report.
    #[arg(short = 's', value_enum, default_value = "maxbuffer")]
    sort: SortArg,

    /// Generate a filter file. Accepts `key=value,...` overrides:
    /// bufferpercent, timepervisit, visits, bufferabsolute, type (usr|com|both).
    #[arg(short = 'g', value_name = "KV,...", num_args = 0..=1, default_missing_value = "")]
    generate: Option<String>,

    /// Completed call-path profile to estimate (JSON report dump).
    profile: PathBuf,
}

fn main() -> ExitCode {
    env_logger::init();
    let opt = Opt::parse();
    match run(opt) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("scorep-score: error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(opt: Opt) -> Result<(), EstimatorError> {
    if !opt.profile.exists() {
        return Err(EstimatorError::ProfileRead {
            path: opt.profile.display().to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
    }

    let preloaded_text = opt
        .filter
        .as_ref()
        .map(|p| {
            std::fs::read_to_string(p).map_err(|source| EstimatorError::FilterFileRead {
                path: p.display().to_string(),
                source,
            })
        })
        .transpose()?;
    let filter = preloaded_text
        .as_deref()
        .map(FilterFile::parse)
        .transpose()?;

    let profile = load_profile(&opt.profile)?;
    let query_names = event_query_names();
    let definitions: Vec<(String, u64)> = profile
        .definition_counters()
        .iter()
        .map(|(name, &count)| (name.clone(), count))
        .collect();
    let oracle = scorep_oracle::EventSizeOracle::populate("otf2-estimator", &definitions, &query_names)
        .map_err(EstimatorError::Oracle)?;

    let mut estimator = Estimator::new(profile, &oracle, opt.dense_metrics, opt.per_region || opt.generate.is_some(), filter)?;
    estimator.run()?;

    let report_opts = ReportOptions {
        per_region: opt.per_region,
        show_mangled: opt.mangled,
        sort: Some(opt.sort.into()),
    };
    print!("{}", format_report(&estimator, &report_opts));

    if let Some(kv) = &opt.generate {
        let gen_opts = parse_generate_kv(kv)?;
        let content = generate_filter_file(&estimator, &gen_opts, preloaded_text.as_deref())?;
        let out_path = PathBuf::from("initial_scorep.filter");
        match write_filter_file(&out_path, &content)? {
            Some(backup) => println!(
                "moved existing '{}' to '{}'",
                out_path.display(),
                backup.display()
            ),
            None => {}
        }
        println!("wrote filter file '{}'", out_path.display());
    }

    Ok(())
}

fn parse_generate_kv(kv: &str) -> Result<FilterGenOptions, EstimatorError> {
    let mut opts = FilterGenOptions::default();
    if kv.is_empty() {
        return Ok(opts);
    }
    for pair in kv.split(',') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        match key {
            "bufferpercent" => opts.buffer_percent = value.parse().unwrap_or(opts.buffer_percent),
            "timepervisit" => opts.time_per_visit_us = value.parse().unwrap_or(opts.time_per_visit_us),
            "visits" => opts.min_visits = value.parse().unwrap_or(opts.min_visits),
            "bufferabsolute" => {
                opts.buffer_absolute_mib = value.parse().unwrap_or(opts.buffer_absolute_mib)
            }
            "type" => {
                if let Some(t) = FilterType::parse(value) {
                    opts.filter_type = t;
                }
            }
            _ => {}
        }
    }
    Ok(opts)
}

/// The full set of event names the catalogue may ask the oracle for.
fn event_query_names() -> Vec<String> {
    [
        "Timestamp",
        "Enter",
        "Leave",
        "CallingContextEnter",
        "CallingContextLeave",
        "CallingContextSample",
        "ProgramBegin",
        "ProgramEnd",
        "Metric",
        "ParameterInt",
        "ParameterString",
        "MpiSend",
        "MpiIsend",
        "MpiIsendComplete",
        "MpiIrecvRequest",
        "MpiRecv",
        "MpiIrecv",
        "MpiCollectiveBegin",
        "MpiCollectiveEnd",
        "NonBlockingCollectiveRequest",
        "NonBlockingCollectiveComplete",
        "ThreadAcquireLock",
        "ThreadReleaseLock",
        "RmaPut",
        "RmaOpCompleteBlocking",
        "RmaOpCompleteRemote",
        "RmaAtomic",
        "RmaCollectiveBegin",
        "RmaCollectiveEnd",
        "RmaWaitChange",
        "RmaRequestLock",
        "RmaReleaseLock",
        "IoCreateHandle",
        "IoDestroyHandle",
        "IoDeleteFile",
        "IoSeek",
        "IoOperationBegin",
        "IoOperationComplete",
        "IoOperationIssued",
        "IoOperationTest",
        "IoDuplicateHandle",
        "IoTryLock",
        "IoAcquireLock",
        "IoOperationCancelled",
        "IoReleaseLock",
        "ThreadFork",
        "ThreadJoin",
        "ThreadTeamBegin",
        "ThreadTeamEnd",
        "ThreadTaskCreate",
        "ThreadTaskComplete",
        "ThreadTaskSwitch",
        "ThreadCreate",
        "ThreadBegin",
        "ThreadWait",
        "ThreadEnd",
        "BufferFlush",
        "MeasurementOnOff",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Opt::command().debug_assert();
    }

    #[test]
    fn requires_profile_positional() {
        assert!(Opt::try_parse_from(["scorep-score"]).is_err());
    }

    #[test]
    fn parses_generate_with_overrides() {
        let opt = Opt::try_parse_from(["scorep-score", "-g=bufferpercent=5,type=com", "p.json"]).unwrap();
        assert_eq!(opt.generate.as_deref(), Some("bufferpercent=5,type=com"));
        let gen_opts = parse_generate_kv(opt.generate.as_deref().unwrap()).unwrap();
        assert_eq!(gen_opts.buffer_percent, 5.0);
        assert_eq!(gen_opts.filter_type, FilterType::Com);
    }

    #[test]
    fn bare_g_flag_uses_defaults() {
        let opt = Opt::try_parse_from(["scorep-score", "-g", "p.json"]).unwrap();
        let gen_opts = parse_generate_kv(opt.generate.as_deref().unwrap_or("")).unwrap();
        assert_eq!(gen_opts, FilterGenOptions::default());
    }
}
