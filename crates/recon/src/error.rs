use thiserror::Error;

use crate::model::Category;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Config validation error (duplicate category, bad key arity, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),

    /// Feed bytes could not be decoded.
    #[error("feed decode error: {0}")]
    Decode(String),

    /// A unit was about to be built from an entity lacking one of its key fields.
    #[error("{category} entity '{entity_id}': missing key field '{field}'")]
    MissingKeyField {
        category: Category,
        entity_id: String,
        field: &'static str,
    },

    /// Sink unavailable or query rejected.
    #[error("sink error on table '{table}': {message}")]
    Sink { table: String, message: String },

    /// Static file could not be loaded.
    #[error("cannot load '{path}': {message}")]
    Load { path: String, message: String },

    /// IO error (file read, etc.).
    #[error("IO error: {0}")]
    Io(String),
}

impl ReconError {
    pub fn sink(table: impl Into<String>, message: impl ToString) -> Self {
        Self::Sink {
            table: table.into(),
            message: message.to_string(),
        }
    }

    pub fn load(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Load {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

impl From<std::io::Error> for ReconError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
