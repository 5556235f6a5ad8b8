//! `trecon run` / `trecon validate` — config-driven sink reconciliation.

use std::path::{Path, PathBuf};

use tracing::info;

use transit_recon::report::{render_diagnostics, render_table};
use transit_recon::{ReconConfig, ReconReport, ReportEntry, RunOptions, RunScope};
use transit_recon_io::{FsSource, SqliteSink};

use crate::exit_codes::{EXIT_DISCREPANCIES, EXIT_INVALID_CONFIG, EXIT_RUNTIME};
use crate::{CliError, Only};

fn read_config(config_path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        CliError::new(
            EXIT_RUNTIME,
            format!("cannot read config {}: {e}", config_path.display()),
        )
    })?;
    ReconConfig::from_toml(&config_str)
        .map_err(|e| CliError::new(EXIT_INVALID_CONFIG, e.to_string()))
}

/// Paths in the config are relative to the config file's directory.
fn base_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn cmd_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    fail_fast: bool,
    only: Option<Only>,
) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    let source = FsSource::new(base_dir(&config_path));

    let sink_path = source.resolve(Path::new(&config.sink));
    let sink = SqliteSink::open(&sink_path).map_err(|e| {
        CliError::new(EXIT_RUNTIME, e.to_string())
            .with_hint("check `sink` in the config; paths are relative to the config file")
    })?;

    let options = RunOptions {
        scope: match only {
            None => RunScope::All,
            Some(Only::Realtime) => RunScope::Realtime,
            Some(Only::Static) => RunScope::Static,
        },
        fail_fast,
    };
    info!(config = %config.name, sink = %sink_path.display(), "starting run");
    let report = transit_recon::run(&config, &sink, &source, options);

    // JSON output
    let output_file = output_file.or_else(|| {
        config
            .output
            .json
            .as_ref()
            .map(|p| source.resolve(Path::new(p)))
    });
    if json_output || output_file.is_some() {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::new(EXIT_RUNTIME, format!("JSON serialization error: {e}")))?;

        if let Some(ref path) = output_file {
            std::fs::write(path, &json_str).map_err(|e| {
                CliError::new(EXIT_RUNTIME, format!("cannot write {}: {e}", path.display()))
            })?;
            eprintln!("wrote {}", path.display());
        }
        if json_output {
            println!("{json_str}");
        }
    }

    // Human summary to stderr
    eprint!("{}", render_table(&report));
    for entry in report.entries() {
        if let ReportEntry::Category(c) = entry {
            if !c.diagnostics.is_empty() {
                eprintln!("{} unmatched units:", c.category);
                eprint!("{}", render_diagnostics(&c.diagnostics));
            }
        }
    }

    exit_status(&report)
}

fn exit_status(report: &ReconReport) -> Result<(), CliError> {
    let aborted = report.aborted().count();
    if aborted > 0 {
        return Err(CliError::new(
            EXIT_RUNTIME,
            format!("{aborted} entr{} aborted", if aborted == 1 { "y" } else { "ies" }),
        ));
    }
    if !report.all_valid() {
        let failing = report.entries().iter().filter(|e| !e.passed()).count();
        return Err(CliError::new(
            EXIT_DISCREPANCIES,
            format!("{failing} of {} entries show discrepancies", report.entries().len()),
        ));
    }
    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    let categories: Vec<&str> = config.realtime.iter().map(|rt| rt.category.as_str()).collect();
    eprintln!(
        "valid: '{}' with {} realtime categor{} [{}], static feed: {}",
        config.name,
        categories.len(),
        if categories.len() == 1 { "y" } else { "ies" },
        categories.join(", "),
        match &config.static_feed {
            Some(st) => st.dir.as_str(),
            None => "none",
        },
    );
    Ok(())
}
