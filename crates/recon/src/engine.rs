use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::{RealtimeConfig, ReconConfig, StaticFeedConfig};
use crate::count::reconcile_counts;
use crate::error::ReconError;
use crate::feed::FeedMessage;
use crate::flatten::{flatten, Flattened};
use crate::matcher::match_unit;
use crate::model::{
    CategoryReport, CategoryTally, ComparisonMode, DimensionReport, MatchOutcome, ReportEntry,
    UnitDiagnostic,
};
use crate::report::{ReconMeta, ReconReport};
use crate::rowset::reconcile_rows;
use crate::sink::{Sink, SourceLoader};

/// Which half of the config a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunScope {
    #[default]
    All,
    Realtime,
    Static,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub scope: RunScope,
    /// Stop after the first aborted entry instead of moving on.
    pub fail_fast: bool,
}

/// Run reconciliation per config.
///
/// A decode, load or sink failure aborts only the category or dimension it
/// happened in; it is recorded as an `Aborted` entry and the run moves on.
pub fn run(
    config: &ReconConfig,
    sink: &dyn Sink,
    source: &dyn SourceLoader,
    options: RunOptions,
) -> ReconReport {
    let mut report = ReconReport::new(ReconMeta {
        config_name: config.name.clone(),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        run_at: chrono::Utc::now().to_rfc3339(),
    });
    let max_diagnostics = config.output.max_diagnostics;

    if options.scope != RunScope::Static {
        for rt in &config.realtime {
            let result = source
                .load_feed(Path::new(&rt.feed))
                .and_then(|feed| reconcile_category(sink, rt, &feed, max_diagnostics));
            if !push(&mut report, rt.category.as_str(), result.map(ReportEntry::Category))
                && options.fail_fast
            {
                return report;
            }
        }
    }

    if options.scope != RunScope::Realtime {
        if let Some(st) = &config.static_feed {
            let files = match static_files(st, source) {
                Ok(files) => files,
                Err(e) => {
                    push(&mut report, "static_feed", Err(e));
                    return report;
                }
            };
            for path in files {
                let name = file_name(&path);
                let result = reconcile_dimension(sink, source, st, &path, max_diagnostics);
                if !push(&mut report, &name, result.map(ReportEntry::Dimension))
                    && options.fail_fast
                {
                    return report;
                }
            }
        }
    }

    report
}

/// Append `result` to the report. Returns false when the entry was aborted.
fn push(report: &mut ReconReport, name: &str, result: Result<ReportEntry, ReconError>) -> bool {
    match result {
        Ok(entry) => {
            report.push(entry);
            true
        }
        Err(e) => {
            warn!(entry = name, error = %e, "reconciliation aborted");
            report.push(ReportEntry::Aborted {
                name: name.to_string(),
                error: e.to_string(),
            });
            false
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn static_files(
    st: &StaticFeedConfig,
    source: &dyn SourceLoader,
) -> Result<Vec<PathBuf>, ReconError> {
    let dir = Path::new(&st.dir);
    if st.files.is_empty() {
        source.list_static_files(dir)
    } else {
        Ok(st.files.iter().map(|f| dir.join(f)).collect())
    }
}

/// Flatten every entity of `feed`, look each unit up in the category's
/// table and judge the resulting tally.
pub fn reconcile_category(
    sink: &dyn Sink,
    rt: &RealtimeConfig,
    feed: &FeedMessage,
    max_diagnostics: usize,
) -> Result<CategoryReport, ReconError> {
    let category = rt.category;
    let table = rt.table();
    let columns = rt.key_columns();
    info!(%category, table, entities = feed.entity.len(), "reconciling category");

    let mut tally = CategoryTally {
        sink_row_total: sink.row_count(table)?,
        ..Default::default()
    };
    let mut seen = HashSet::new();
    let mut diagnostics = Vec::new();

    for entity in &feed.entity {
        tally.entities_seen += 1;
        let units = match flatten(category, entity) {
            Flattened::Absent => {
                tally.entities_without_payload += 1;
                continue;
            }
            Flattened::Units(units) => units,
        };

        let mut produced = 0usize;
        for unit in units {
            let unit = unit?;
            produced += 1;
            if !seen.insert(unit.key.clone()) {
                tally.duplicate_unit_keys += 1;
            }

            let lookup = match_unit(sink, table, &columns, &unit)?;
            tally.record(lookup.outcome);
            if lookup.outcome != MatchOutcome::Matched && diagnostics.len() < max_diagnostics {
                diagnostics.push(UnitDiagnostic {
                    key: unit.key,
                    outcome: lookup.outcome,
                    sink_rows: lookup.sink_rows,
                });
            }
        }
        if produced == 0 {
            tally.entities_without_units += 1;
        }
    }

    let verdict = reconcile_counts(&tally);
    info!(
        %category,
        units = tally.units_seen,
        sink_rows = tally.sink_row_total,
        matches = tally.exact_matches,
        valid = verdict.valid,
        "category reconciled"
    );
    if tally.entities_without_payload > 0 {
        warn!(%category, count = tally.entities_without_payload, "entities without payload");
    }

    Ok(CategoryReport {
        category,
        table: table.to_string(),
        tally,
        verdict,
        diagnostics,
    })
}

/// Compare one static file with its sink table row for row.
pub fn reconcile_dimension(
    sink: &dyn Sink,
    source: &dyn SourceLoader,
    st: &StaticFeedConfig,
    path: &Path,
    max_diagnostics: usize,
) -> Result<DimensionReport, ReconError> {
    let name = file_name(path);
    let table = st.table_for(&name);
    info!(dimension = %name, table = %table, "reconciling dimension");

    let file_rows = source.load_rows(path)?;
    let sink_rows = sink.table_rows(&table)?;
    let report = reconcile_rows(&name, &table, &file_rows, &sink_rows, st.mode, max_diagnostics);

    if !report.identical && st.mode == ComparisonMode::Ordered {
        warn!(dimension = %name, "rows differ; ordered comparison also fails on reordering");
    }
    info!(
        dimension = %name,
        file_rows = report.file_rows,
        sink_rows = report.sink_rows,
        identical = report.identical,
        "dimension reconciled"
    );
    Ok(report)
}
