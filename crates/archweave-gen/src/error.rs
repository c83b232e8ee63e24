//! Generation errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while writing generated artifacts.
#[derive(Debug, Error)]
pub enum GenError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid output name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },
}

/// Convenience alias for generation results.
pub type Result<T> = std::result::Result<T, GenError>;
