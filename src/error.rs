//! Error type shared by every command.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FzCmdError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown source '{0}' (expected one of: curated, alias, function, history, tldr)")]
    UnknownSource(String),

    #[error("Invalid limit '{0}', expected SOURCE:COUNT")]
    InvalidLimit(String),

    #[error("Invalid input '{0}', expected SOURCE=PATH")]
    InvalidInput(String),

    #[error("Invalid priority order: {0}")]
    InvalidPriority(String),

    #[error("Failed to read config from {path}: {source}")]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("Failed to parse config {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Failed to write recent commands to {path}: {source}")]
    RecentWrite { path: PathBuf, source: io::Error },

    #[error("Cache directory not found")]
    NoCacheDir,
}

impl FzCmdError {
    /// The downstream reader (fzf, `head`) went away before we finished writing.
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, FzCmdError::Io(e) if e.kind() == io::ErrorKind::BrokenPipe)
    }
}
