// trecon - verify a transit-data sink against its real-time and static sources

mod exit_codes;
mod inspect;
mod logging;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};
use logging::{setup_logging, LogFormat, Verbosity};
use transit_recon::Category;

#[derive(Parser)]
#[command(name = "trecon")]
#[command(about = "Reconcile an ingestion pipeline's sink with its GTFS / GTFS-Realtime sources")]
#[command(version)]
struct Cli {
    /// Log verbosity
    #[arg(long, global = true, value_enum, default_value = "warn")]
    verbosity: Verbosity,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run reconciliation from a TOML config file
    #[command(after_help = "\
Exit codes: 0 consistent, 1 discrepancies, 2 usage, 3 invalid config, 4 runtime failure.

Examples:
  trecon run recon.toml
  trecon run recon.toml --json
  trecon run recon.toml --output report.json
  trecon run recon.toml --only static --fail-fast")]
    Run {
        /// Path to the reconciliation config (.toml)
        config: PathBuf,

        /// Print the JSON report to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON report to a file (overrides [output].json)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Stop after the first aborted category or dimension
        #[arg(long)]
        fail_fast: bool,

        /// Reconcile only one half of the config
        #[arg(long, value_enum)]
        only: Option<Only>,
    },

    /// Validate a config without running
    #[command(after_help = "\
Examples:
  trecon validate recon.toml")]
    Validate {
        /// Path to the reconciliation config (.toml)
        config: PathBuf,
    },

    /// Decode a feed file and list the comparison units it flattens into
    #[command(after_help = "\
Examples:
  trecon inspect rt/trip-update.pb --category trip-update
  trecon inspect rt/alerts.pb --category alert --json")]
    Inspect {
        /// Serialized feed message
        feed: PathBuf,

        /// Category to flatten the feed as
        #[arg(long, value_enum)]
        category: CategoryArg,

        /// Print JSON instead of one key per line
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Only {
    Realtime,
    Static,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum CategoryArg {
    #[value(alias = "trip_update")]
    TripUpdate,
    Alert,
    #[value(alias = "vehicle_position")]
    VehiclePosition,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::TripUpdate => Category::TripUpdate,
            CategoryArg::Alert => Category::Alert,
            CategoryArg::VehiclePosition => Category::VehiclePosition,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(if e.use_stderr() { EXIT_USAGE } else { EXIT_SUCCESS });
        }
    };
    setup_logging(cli.verbosity, cli.log_format);

    let result = match cli.command {
        Commands::Run {
            config,
            json,
            output,
            fail_fast,
            only,
        } => recon::cmd_run(config, json, output, fail_fast, only),
        Commands::Validate { config } => recon::cmd_validate(config),
        Commands::Inspect {
            feed,
            category,
            json,
        } => inspect::cmd_inspect(feed, category.into(), json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
