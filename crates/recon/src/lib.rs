//! `transit-recon` — verifies a transit-data sink against its sources.
//!
//! Pure engine crate: flattens real-time feed entities into comparison
//! units, looks them up in the sink, reconciles counts per category and
//! compares static schedule files row for row. Database and filesystem
//! access live behind the traits in [`sink`].

pub mod config;
pub mod count;
pub mod engine;
pub mod error;
pub mod feed;
pub mod flatten;
pub mod matcher;
pub mod model;
pub mod report;
pub mod rowset;
pub mod sink;

pub use config::ReconConfig;
pub use engine::{run, RunOptions, RunScope};
pub use error::ReconError;
pub use model::{Category, ReportEntry, Row};
pub use report::ReconReport;
pub use sink::{Sink, SourceLoader};
