//! Host store error types
//!
//! Fatal errors that stop the current command. Recoverable problems
//! (bad ports, duplicate aliases, failed lookups) are reported as warnings
//! instead and only clear the store's exportable flag.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading, cleaning or writing a host store
#[derive(Error, Debug)]
pub enum StoreError {
    /// A line in an SSH config file is not `Key Value`
    #[error("Unexpected syntax - check {} line {line}", .path.display())]
    SshSyntax { path: PathBuf, line: usize },

    /// A JSON store file could not be parsed
    #[error("Likely syntax error in {}: {message}", .path.display())]
    InvalidJson { path: PathBuf, message: String },

    /// A JSON store file decoded to nothing
    #[error("Likely syntax error - no data decoded from {}", .path.display())]
    EmptyJson { path: PathBuf },

    /// Export attempted while validation warnings are outstanding
    #[error(
        "Config is not exportable - fix the warnings above in the JSON config files and try again"
    )]
    NotExportable,

    /// Cleaning lost or duplicated host records
    #[error("Host count changed while cleaning ({before} before, {after} after)")]
    HostCountMismatch { before: usize, after: usize },

    /// Host data that cannot be represented
    #[error("Host data with key '{key}' is invalid: {message}")]
    InvalidHost { key: String, message: String },

    /// No host carries the given alias
    #[error("Host not found: {0}")]
    HostNotFound(String),

    /// Filesystem failure
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
