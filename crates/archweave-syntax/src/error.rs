//! Error types for source loading.

use std::path::PathBuf;

/// Errors that can occur while locating and reading architecture sources.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// I/O error reading a source file or directory.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The path being read.
        path: PathBuf,
        source: std::io::Error,
    },

    /// Source directory not found.
    #[error("source directory not found: {}", path.display())]
    NotFound {
        /// The directory that was not found.
        path: PathBuf,
    },
}

/// Result type for loading operations.
pub type Result<T> = std::result::Result<T, LoadError>;
