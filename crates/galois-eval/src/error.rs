//! Typed failures raised while reading and scoring query result files.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    /// A directory or file that the run cannot proceed without is missing.
    #[error("path not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Only `.csv` and `.json` result files are understood.
    #[error("unsupported file type: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// A normalized cell could not be read as a number. Only ever produced
    /// inside the similarity engine, which falls back to edit distance.
    #[error("not a numeric value: `{value}`")]
    MalformedValue { value: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to parse JSON {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type EvalResult<T> = Result<T, EvalError>;
