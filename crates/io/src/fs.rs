//! Filesystem-backed [`SourceLoader`].

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use transit_recon::error::ReconError;
use transit_recon::feed::{decode_feed, FeedMessage};
use transit_recon::model::Row;
use transit_recon::sink::SourceLoader;

use crate::csv::CsvLoader;

/// Resolves relative paths against `base_dir` (the CLI passes the config
/// file's directory).
#[derive(Debug, Clone, Default)]
pub struct FsSource {
    base_dir: PathBuf,
    csv: CsvLoader,
}

impl FsSource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            csv: CsvLoader::default(),
        }
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl SourceLoader for FsSource {
    fn load_feed(&self, path: &Path) -> Result<FeedMessage, ReconError> {
        let path = self.resolve(path);
        let bytes = fs::read(&path).map_err(|e| ReconError::load(path.display().to_string(), e))?;
        debug!(path = %path.display(), bytes = bytes.len(), "feed read");
        decode_feed(&bytes)
    }

    fn load_rows(&self, path: &Path) -> Result<Vec<Row>, ReconError> {
        self.csv.load(&self.resolve(path))
    }

    /// `*.txt` entries of `dir`, sorted by file name. Returned paths keep the
    /// caller's (unresolved) prefix.
    fn list_static_files(&self, dir: &Path) -> Result<Vec<PathBuf>, ReconError> {
        let resolved = self.resolve(dir);
        let entries = fs::read_dir(&resolved)
            .map_err(|e| ReconError::load(resolved.display().to_string(), e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("txt") {
                names.push(entry.file_name());
            }
        }
        names.sort();
        Ok(names.into_iter().map(|n| dir.join(n)).collect())
    }
}
