use std::collections::HashSet;

use serde::Deserialize;

use crate::error::ReconError;
use crate::model::{Category, ComparisonMode};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// One reconciliation run: which sink to check and against which sources.
///
/// Paths are kept as written; callers resolve them (the CLI resolves them
/// relative to the config file).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    pub name: String,
    /// Sink database produced by the ingestion pipeline.
    pub sink: String,
    /// Real-time categories, reconciled in the order listed.
    #[serde(default)]
    pub realtime: Vec<RealtimeConfig>,
    #[serde(default)]
    pub static_feed: Option<StaticFeedConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Real-time
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RealtimeConfig {
    pub category: Category,
    /// Serialized feed message file.
    pub feed: String,
    /// Overrides the category's default sink table.
    #[serde(default)]
    pub table: Option<String>,
    /// Overrides the category's default key columns. Must match the key arity.
    #[serde(default)]
    pub key_columns: Option<Vec<String>>,
}

impl RealtimeConfig {
    pub fn table(&self) -> &str {
        self.table
            .as_deref()
            .unwrap_or_else(|| self.category.default_table())
    }

    pub fn key_columns(&self) -> Vec<String> {
        match &self.key_columns {
            Some(cols) => cols.clone(),
            None => self
                .category
                .default_key_columns()
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Static schedule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticFeedConfig {
    /// Directory holding the static schedule text files.
    pub dir: String,
    /// Prepended to each file stem to name its sink table.
    #[serde(default)]
    pub table_prefix: String,
    /// File names to compare, in order. Empty means every `*.txt` in `dir`.
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub mode: ComparisonMode,
}

impl StaticFeedConfig {
    /// Sink table for a static file name (`stops.txt` -> `<prefix>stops`).
    pub fn table_for(&self, file_name: &str) -> String {
        let stem = file_name.strip_suffix(".txt").unwrap_or(file_name);
        format!("{}{}", self.table_prefix, stem)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default)]
    pub json: Option<String>,
    /// Differing units / rows kept per report entry.
    #[serde(default = "default_max_diagnostics")]
    pub max_diagnostics: usize,
}

fn default_max_diagnostics() -> usize {
    20
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json: None,
            max_diagnostics: default_max_diagnostics(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }
        if self.sink.trim().is_empty() {
            return Err(ReconError::ConfigValidation("sink must not be empty".into()));
        }
        if self.realtime.is_empty() && self.static_feed.is_none() {
            return Err(ReconError::ConfigValidation(
                "at least one [[realtime]] entry or a [static_feed] section is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for rt in &self.realtime {
            if !seen.insert(rt.category) {
                return Err(ReconError::ConfigValidation(format!(
                    "category '{}' listed more than once",
                    rt.category
                )));
            }
            if rt.feed.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "category '{}': feed must not be empty",
                    rt.category
                )));
            }
            if let Some(cols) = &rt.key_columns {
                if cols.len() != rt.category.arity() {
                    return Err(ReconError::ConfigValidation(format!(
                        "category '{}': expected {} key column(s), found {}",
                        rt.category,
                        rt.category.arity(),
                        cols.len()
                    )));
                }
                if cols.iter().any(|c| c.is_empty()) {
                    return Err(ReconError::ConfigValidation(format!(
                        "category '{}': key column names must not be empty",
                        rt.category
                    )));
                }
            }
        }

        if let Some(st) = &self.static_feed {
            if st.dir.trim().is_empty() {
                return Err(ReconError::ConfigValidation(
                    "static_feed.dir must not be empty".into(),
                ));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
