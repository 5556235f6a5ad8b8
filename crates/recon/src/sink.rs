//! Collaborator seams: the sink being checked and the authoritative sources.
//!
//! The engine never touches a database or the filesystem directly; the io
//! crate provides SQLite- and filesystem-backed implementations.

use std::path::{Path, PathBuf};

use crate::error::ReconError;
use crate::feed::FeedMessage;
use crate::model::Row;

/// Read-only access to the relational store populated by the ingestion pipeline.
pub trait Sink {
    /// Total number of rows in `table`.
    fn row_count(&self, table: &str) -> Result<u64, ReconError>;

    /// Rows of `table` whose columns equal the given values (AND-combined, exact).
    fn lookup(&self, table: &str, predicate: &[(&str, &str)]) -> Result<Vec<Row>, ReconError>;

    /// Every row of `table`, in storage order.
    fn table_rows(&self, table: &str) -> Result<Vec<Row>, ReconError>;
}

/// Loads the authoritative side of a run.
pub trait SourceLoader {
    /// Read and decode one real-time feed file.
    fn load_feed(&self, path: &Path) -> Result<FeedMessage, ReconError>;

    /// Read one static schedule file as text rows.
    fn load_rows(&self, path: &Path) -> Result<Vec<Row>, ReconError>;

    /// Static schedule files in `dir`, in processing order.
    fn list_static_files(&self, dir: &Path) -> Result<Vec<PathBuf>, ReconError>;
}
