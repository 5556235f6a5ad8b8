//! `trecon inspect` — show how a feed flattens, without touching a sink.

use std::path::{Path, PathBuf};

use serde_json::json;

use transit_recon::flatten::{flatten, Flattened};
use transit_recon::sink::SourceLoader;
use transit_recon::Category;
use transit_recon_io::FsSource;

use crate::exit_codes::EXIT_RUNTIME;
use crate::CliError;

#[derive(Default)]
struct Coverage {
    entities: u64,
    without_payload: u64,
    without_units: u64,
    units: Vec<Vec<String>>,
    errors: Vec<String>,
}

pub fn cmd_inspect(
    feed_path: PathBuf,
    category: Category,
    json_output: bool,
) -> Result<(), CliError> {
    let feed = FsSource::new(".")
        .load_feed(&feed_path)
        .map_err(|e| CliError::new(EXIT_RUNTIME, e.to_string()))?;

    let mut cov = Coverage::default();
    for entity in &feed.entity {
        cov.entities += 1;
        let units = match flatten(category, entity) {
            Flattened::Absent => {
                cov.without_payload += 1;
                continue;
            }
            Flattened::Units(units) => units,
        };
        let mut produced = 0;
        for unit in units {
            produced += 1;
            match unit {
                Ok(unit) => cov.units.push(unit.key.values().to_vec()),
                Err(e) => cov.errors.push(e.to_string()),
            }
        }
        if produced == 0 {
            cov.without_units += 1;
        }
    }

    if json_output {
        let value = json!({
            "feed": feed_path.display().to_string(),
            "category": category,
            "entities": cov.entities,
            "entities_without_payload": cov.without_payload,
            "entities_without_units": cov.without_units,
            "units": cov.units,
            "errors": cov.errors,
        });
        let out = serde_json::to_string_pretty(&value)
            .map_err(|e| CliError::new(EXIT_RUNTIME, format!("JSON serialization error: {e}")))?;
        println!("{out}");
    } else {
        for key in &cov.units {
            println!("{}", key.join("\t"));
        }
        for err in &cov.errors {
            eprintln!("error: {err}");
        }
    }

    eprintln!(
        "{}: {} entities, {} units, {} without payload, {} without units",
        display_name(&feed_path),
        cov.entities,
        cov.units.len(),
        cov.without_payload,
        cov.without_units,
    );

    if cov.errors.is_empty() {
        Ok(())
    } else {
        Err(CliError::new(
            EXIT_RUNTIME,
            format!("{} unit(s) missing key fields", cov.errors.len()),
        ))
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
