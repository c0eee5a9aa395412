use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaLoadError {
    #[error("unknown schema '{0}'")]
    Unknown(String),

    #[error("failed to read {name} schema from {}: {source}", path.display())]
    Read {
        name: String,
        path: PathBuf,
        source: io::Error,
    },

    #[error("failed to parse {name} schema from {}: {source}", path.display())]
    Parse {
        name: String,
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{name} schema in {} is not a JSON object", path.display())]
    NotAnObject { name: String, path: PathBuf },

    #[error("failed to load {name} schema: {source}")]
    Store {
        name: String,
        source: PersistenceError,
    },
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("stored document {store} is malformed: {source}")]
    Corrupt {
        store: String,
        source: serde_json::Error,
    },

    #[error("failed to serialize {store}: {source}")]
    Serialize {
        store: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    NonStringEntry { key: String, value: String },
    DuplicateTarget(String),
    MissingRequiredField(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonStringEntry { key, value } => {
                write!(f, "non-string entry: '{key}' -> {value}")
            }
            Self::DuplicateTarget(value) => write!(f, "duplicate normalized field: {value}"),
            Self::MissingRequiredField(name) => write!(f, "missing required field: {name}"),
        }
    }
}

#[derive(Debug, Error)]
#[error("schema '{schema}' failed validation: {}", render_findings(.errors))]
pub struct SchemaValidationError {
    pub schema: String,
    pub errors: Vec<ValidationError>,
}

fn render_findings(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum MappingError {
    #[error(transparent)]
    Validation(#[from] SchemaValidationError),

    #[error("no resolution supplied for header '{header}': {reason}")]
    Unresolved { header: String, reason: String },

    #[error("'{choice}' is not a canonical field of the active schema (header '{header}')")]
    InvalidChoice { header: String, choice: String },
}
