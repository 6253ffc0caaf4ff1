//! Error types for ct-output.
//!
//! Every variant names the journal file or table it failed on, so a failed
//! flush at the end of a long run points straight at the broken sink.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while writing the run journal.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("cannot create journal directory {}: {source}", .dir.display())]
    CreateDir { dir: PathBuf, source: std::io::Error },

    #[error("{file}: {source}")]
    Csv { file: &'static str, source: csv::Error },

    #[error("{file}: flush failed: {source}")]
    Flush { file: &'static str, source: std::io::Error },

    /// `target` is the database file for schema errors, otherwise the table.
    #[cfg(feature = "sqlite")]
    #[error("{target}: {source}")]
    Sqlite { target: &'static str, source: rusqlite::Error },
}

impl OutputError {
    pub(crate) fn csv(file: &'static str) -> impl FnOnce(csv::Error) -> Self {
        move |source| OutputError::Csv { file, source }
    }

    pub(crate) fn flush(file: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| OutputError::Flush { file, source }
    }

    #[cfg(feature = "sqlite")]
    pub(crate) fn sqlite(target: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| OutputError::Sqlite { target, source }
    }
}

/// Alias for `Result<T, OutputError>`.
pub type OutputResult<T> = Result<T, OutputError>;
