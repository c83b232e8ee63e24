//! Verification input errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading the artifacts a verifier compares against.
///
/// Findings about the artifacts themselves are never errors; they are
/// reported as [`Violation`](crate::report::Violation)s.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact directory not found: {}", path.display())]
    NotFound { path: PathBuf },
}

/// Convenience alias for verification results.
pub type Result<T> = std::result::Result<T, VerifyError>;
