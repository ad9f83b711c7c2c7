use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use flowpoint::config;
use flowpoint::harness::{HarnessError, ProbeSpec, ScenarioConfig, run_scenario};
use flowpoint::{
    JsonFileReporter, PollPolicy, Poller, RunResult, Session, TracingReporter, cleanup_old_sessions, list_sessions,
    load_summary,
};

/// flowpoint - poll conditions and run verification flows
#[derive(Parser, Debug)]
#[command(
    name = "flowpoint",
    about = "Condition polling and soft-asserted verification flows",
    after_help = "ENVIRONMENT VARIABLES:\n\
        FLOWPOINT_TIMEOUT_MS         Default poll timeout (ms)\n\
        FLOWPOINT_INTERVAL_MS        Default poll interval (ms)\n\
        FLOWPOINT_INITIAL_DELAY_MS   Default delay before the first probe (ms)\n\
        FLOWPOINT_REPORT_DIR         Base directory for report sessions\n\
        FLOWPOINT_LOG                Log filter when RUST_LOG is unset"
)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Poll a command until it exits successfully
    Wait {
        /// Give up after this many milliseconds
        #[arg(long, env = "FLOWPOINT_TIMEOUT_MS", default_value = "15000")]
        timeout_ms: u64,

        /// Delay between attempts in milliseconds
        #[arg(long, env = "FLOWPOINT_INTERVAL_MS", default_value = "500")]
        interval_ms: u64,

        /// Delay before the first attempt in milliseconds
        #[arg(long, env = "FLOWPOINT_INITIAL_DELAY_MS", default_value = "0")]
        initial_delay_ms: u64,

        /// Keep polling even when the command cannot be started
        #[arg(long)]
        tolerate_all: bool,

        /// Command to run, with its arguments
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },

    /// Run a JSON scenario and write its report
    Run {
        /// Scenario file
        #[arg(short, long)]
        scenario: PathBuf,

        /// Report directory (default: auto-generated in the report base dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep the report after completion (default: cleanup unless --output or --json is specified)
        #[arg(long, short = 'k')]
        keep: bool,

        /// Output results as JSON (keeps the report it points to)
        #[arg(long)]
        json: bool,
    },

    /// List report sessions in the report base dir
    Sessions {
        /// Remove sessions older than this many hours instead of listing
        #[arg(long)]
        prune_hours: Option<u64>,
    },

    /// Print a saved JSON report
    Report {
        /// Report file written by `run`
        file: PathBuf,
    },
}

fn main() -> Result<ExitCode, Box<dyn Error>> {
    init_tracing();
    let args = Args::parse();

    match args.command {
        Commands::Wait {
            timeout_ms,
            interval_ms,
            initial_delay_ms,
            tolerate_all,
            command,
        } => {
            let policy = PollPolicy::new(Duration::from_millis(timeout_ms), Duration::from_millis(interval_ms))
                .initial_delay(Duration::from_millis(initial_delay_ms))
                .tolerate_all_errors(tolerate_all);

            let (program, rest) = command
                .split_first()
                .ok_or("a command to poll is required")?;
            let probe = ProbeSpec::Command {
                program: program.clone(),
                args: rest.to_vec(),
            };

            let outcome = Poller::new().poll(|| probe.evaluate(), &policy)?;
            if outcome.satisfied {
                println!(
                    "{} after {} attempt(s) in {} ms",
                    probe.label(),
                    outcome.attempts,
                    outcome.elapsed.as_millis()
                );
                Ok(ExitCode::SUCCESS)
            } else {
                eprintln!(
                    "Timed out after {} ms ({} attempts) waiting for {}",
                    outcome.elapsed.as_millis(),
                    outcome.attempts,
                    probe.label()
                );
                Ok(ExitCode::FAILURE)
            }
        }

        Commands::Run {
            scenario,
            output,
            keep,
            json,
        } => {
            let config = ScenarioConfig::load(&scenario)?;

            let session = report_session(&config.name, output.as_deref(), keep, json);
            session.init()?;

            let report_path = session.report_path(&config.name);
            let reporter = (
                TracingReporter::new(config.name.clone()),
                JsonFileReporter::new(&report_path),
            );

            let result = match run_scenario(&config, reporter) {
                Ok(summary) => RunResult::passed(summary, Some(report_path)),
                Err(HarnessError::Assertion(summary)) => RunResult::failed(
                    format!("{} of {} steps failed", summary.failed_count, summary.total),
                    Some(*summary),
                    Some(report_path),
                ),
                Err(err) => RunResult::failed(err.to_string(), None, None),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                if let Some(summary) = &result.summary {
                    print!("{}", summary);
                }
                if let Some(error) = &result.error {
                    eprintln!("Run failed: {}", error);
                }
                if session.keep {
                    println!("\nReport: {}", session.report_path(&config.name).display());
                }
            }

            Ok(if result.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Commands::Sessions { prune_hours } => {
            if let Some(hours) = prune_hours {
                let removed = cleanup_old_sessions(Duration::from_secs(hours * 3600))?;
                println!("Removed {} session(s) older than {} h", removed, hours);
            } else {
                for dir in list_sessions()? {
                    println!("{}", dir.display());
                }
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Report { file } => {
            let summary = load_summary(&file)?;
            print!("{}", summary);
            Ok(if summary.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

/// Session for a run's report. An explicit `--output` dir is always kept,
/// and so is the report a `--json` result points at.
fn report_session(name: &str, output: Option<&Path>, keep: bool, json: bool) -> Session {
    match output {
        Some(dir) => Session::in_dir(dir).keep(true),
        None => Session::with_name(name).keep(keep || json),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config::log_filter())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
