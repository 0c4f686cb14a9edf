//! `session_validity` command line entry point.
//!
//! Usage:
//!   session_validity [--config <validity.toml|json>] [--log-dir <dir>] [--verbose] <session.json>
//!
//! Prints the session report as pretty JSON on stdout. Without `--config` the
//! per-user configuration (~/.config/session-validity/validity.toml) is used.

use anyhow::{bail, Context};
use session_validity::config::loader::{get_global_config_path, load_config_from_file};
use session_validity::input::load_responses_from_file;
use session_validity::{LogCollector, SessionValidator, ValidityError};
use std::path::PathBuf;
use std::process::ExitCode;

const USAGE: &str =
    "usage: session_validity [--config <file>] [--log-dir <dir>] [--verbose] <session.json>";

struct CliArgs {
    config: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    verbose: bool,
    session: PathBuf,
}

/// `Ok(None)` means help was requested.
fn parse_args(args: impl Iterator<Item = String>) -> anyhow::Result<Option<CliArgs>> {
    let mut config = None;
    let mut log_dir = None;
    let mut verbose = false;
    let mut session = None;

    let mut args = args;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                config = Some(PathBuf::from(args.next().context("--config needs a path")?));
            }
            "--log-dir" => {
                log_dir = Some(PathBuf::from(args.next().context("--log-dir needs a path")?));
            }
            "--verbose" | "-v" => verbose = true,
            "--help" | "-h" => return Ok(None),
            other if other.starts_with('-') => bail!("unknown option {}\n{}", other, USAGE),
            other => {
                if session.replace(PathBuf::from(other)).is_some() {
                    bail!("only one session file may be given\n{}", USAGE);
                }
            }
        }
    }

    Ok(Some(CliArgs {
        config,
        log_dir,
        verbose,
        session: session.context(USAGE)?,
    }))
}

fn run(args: CliArgs) -> anyhow::Result<()> {
    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let collector = LogCollector::new(args.log_dir.as_deref(), level, true)?;
    if let Err(e) = collector.install() {
        eprintln!("[Main] WARNING: Failed to set LogCollector as global logger: {}", e);
    }

    let config_path = match args.config {
        Some(path) => path,
        None => get_global_config_path().map_err(ValidityError::from)?,
    };
    let config = load_config_from_file(&config_path).map_err(ValidityError::from)?;
    let responses = load_responses_from_file(&args.session).map_err(ValidityError::from)?;

    log::info!(
        "Assessing {} responses from {}",
        responses.len(),
        args.session.display()
    );

    let report = SessionValidator::new(config).assess_session(&responses);
    let json = serde_json::to_string_pretty(&report).context("Failed to encode report")?;
    println!("{}", json);

    collector.wait_for_empty()?;
    Ok(())
}

fn main() -> ExitCode {
    let result = match parse_args(std::env::args().skip(1)) {
        Ok(Some(args)) => run(args),
        Ok(None) => {
            println!("{}", USAGE);
            return ExitCode::SUCCESS;
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ValidityError>() {
                Some(err) => eprintln!("error: {}", err.user_message()),
                None => eprintln!("error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}
