//! Concrete collaborators for the `transit-recon` engine: the SQLite sink
//! written by the ingestion pipeline, and the feed / schedule files on disk.

pub mod csv;
pub mod fs;
pub mod sqlite;

pub use crate::csv::CsvLoader;
pub use crate::fs::FsSource;
pub use crate::sqlite::SqliteSink;
