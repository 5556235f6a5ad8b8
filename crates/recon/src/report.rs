use serde::Serialize;

use crate::model::{ReportEntry, UnitDiagnostic};

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

/// Everything a run produced, in processing order.
#[derive(Debug, Clone, Serialize)]
pub struct ReconReport {
    pub meta: ReconMeta,
    entries: Vec<ReportEntry>,
}

impl ReconReport {
    pub fn new(meta: ReconMeta) -> Self {
        Self {
            meta,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: ReportEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn entry(&self, name: &str) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// True when every entry is a valid category or an identical dimension.
    pub fn all_valid(&self) -> bool {
        self.entries.iter().all(ReportEntry::passed)
    }

    pub fn aborted(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e, ReportEntry::Aborted { .. }))
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

const HEADERS: [&str; 6] = ["NAME", "KIND", "SOURCE", "SINK", "MATCHED", "VERDICT"];

fn columns(entry: &ReportEntry) -> [String; 6] {
    match entry {
        ReportEntry::Category(c) => {
            let verdict = if c.verdict.valid {
                "valid".to_string()
            } else {
                let broken: Vec<String> = c.verdict.broken.iter().map(|b| b.to_string()).collect();
                format!("invalid: {}", broken.join(", "))
            };
            [
                c.category.to_string(),
                "realtime".into(),
                c.tally.units_seen.to_string(),
                c.tally.sink_row_total.to_string(),
                c.tally.exact_matches.to_string(),
                verdict,
            ]
        }
        ReportEntry::Dimension(d) => [
            d.dimension.clone(),
            "static".into(),
            d.file_rows.to_string(),
            d.sink_rows.to_string(),
            if d.identical { "yes" } else { "no" }.into(),
            if d.identical {
                "identical".into()
            } else {
                format!("differs (+{}/-{})", d.only_in_sink, d.only_in_file)
            },
        ],
        ReportEntry::Aborted { name, error } => [
            name.clone(),
            "-".into(),
            "-".into(),
            "-".into(),
            "-".into(),
            format!("aborted: {error}"),
        ],
    }
}

/// Fixed-column text table, one line per entry.
pub fn render_table(report: &ReconReport) -> String {
    let rows: Vec<[String; 6]> = report.entries().iter().map(columns).collect();

    let mut widths = HEADERS.map(str::len);
    for r in &rows {
        for (w, cell) in widths.iter_mut().zip(r.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut line = |cells: &[String]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths.iter())
            .enumerate()
            .map(|(i, (c, &w))| {
                if i == cells.len() - 1 {
                    c.clone()
                } else {
                    format!("{c:<w$}")
                }
            })
            .collect();
        out.push_str(padded.join("  ").trim_end());
        out.push('\n');
    };

    line(&HEADERS.map(String::from));
    for r in &rows {
        line(r);
    }
    out
}

/// Keys of the units that failed to match, one per line.
pub fn render_diagnostics(diagnostics: &[UnitDiagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("  {} {} ({} sink rows)\n", d.outcome, d.key, d.sink_rows))
        .collect()
}
