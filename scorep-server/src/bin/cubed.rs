//! `cubed`: the cube network protocol server (spec.md §4.9). The
//! sync-CLI-wrapping-a-tokio-runtime shape follows `samply/src/server.rs`'s
//! `server` subcommand.
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;

/// Serve a cube profile over the network for remote queries.
#[derive(Debug, Parser)]
#[command(name = "cubed", version, about)]
struct Opt {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:3300")]
    listen: String,

    /// Preload a report so every connecting client sees it already open,
    /// without sending its own `OpenCube` request first.
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum CubedError {
    #[error("failed to preload report '{path}': {source}")]
    Preload { path: String, source: scorep_requests::RequestError },

    #[error(transparent)]
    Server(#[from] scorep_server::ServerError),
}

fn main() -> ExitCode {
    env_logger::init();
    let opt = Opt::parse();
    match run(opt) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("cubed: error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn run(opt: Opt) -> Result<(), CubedError> {
    let preload = match opt.report {
        Some(path) => {
            let path_string = path.display().to_string();
            let profile = scorep_requests::open_report_file(&path_string)
                .map_err(|source| CubedError::Preload { path: path_string.clone(), source })?;
            Some((path_string, profile))
        }
        None => None,
    };

    scorep_server::bind_and_serve(&opt.listen, preload).await?;
    Ok(())
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
    fn listen_defaults_to_the_well_known_port() {
        let opt = Opt::try_parse_from(["cubed"]).unwrap();
        assert_eq!(opt.listen, "0.0.0.0:3300");
        assert!(opt.report.is_none());
    }

    #[test]
    fn report_flag_is_accepted() {
        let opt = Opt::try_parse_from(["cubed", "--report", "p.json"]).unwrap();
        assert_eq!(opt.report, Some(PathBuf::from("p.json")));
    }
}
