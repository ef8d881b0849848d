//! Domain-specific errors for the install pipeline.
//!
//! One variant per pipeline stage, so a failure always names the stage
//! that killed the install: fetch, integrity, dependency resolution,
//! build, or post-install verification.

use keg_core::builder::{BuildError, DependencyError};
use keg_core::fetch::FetchError;
use keg_core::formula::FormulaError;
use keg_core::receipt::ReceiptError;
use keg_core::smoke::VerifyError;
use thiserror::Error;

/// Errors surfaced by `keg install` and the ops layer.
#[derive(Error, Debug)]
pub enum InstallError {
    /// The formula file is unreadable, unparseable, or invalid.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The source URL was unreachable or the archive unreadable.
    #[error("Fetch failed: {0}")]
    Fetch(#[source] FetchError),

    /// The fetched archive's digest does not equal the declared digest.
    #[error("Integrity check failed: expected {expected}, got {actual}")]
    Integrity {
        /// Digest declared by the formula.
        expected: String,
        /// Digest computed over the fetched bytes.
        actual: String,
    },

    /// A build-time tool is missing from the host.
    #[error("Dependency resolution failed: {0}")]
    Dependency(#[from] DependencyError),

    /// The build script exited non-zero.
    #[error("Build failed: {0}")]
    Build(#[from] BuildError),

    /// A post-install smoke check failed.
    #[error("Verification failed: {0}")]
    Verification(#[from] VerifyError),

    /// Install receipt could not be read or written.
    #[error("Receipt error: {0}")]
    Receipt(#[from] ReceiptError),

    /// Filesystem plumbing failed outside any specific stage.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<FetchError> for InstallError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::HashMismatch { expected, actual } => {
                Self::Integrity { expected, actual }
            }
            other => Self::Fetch(other),
        }
    }
}

impl From<FormulaError> for InstallError {
    fn from(err: FormulaError) -> Self {
        match err {
            FormulaError::Io(e) => Self::Io(e),
            other => Self::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_mismatch_maps_to_integrity() {
        let err: InstallError = FetchError::HashMismatch {
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        }
        .into();
        assert!(matches!(err, InstallError::Integrity { .. }));
    }

    #[test]
    fn test_io_fetch_error_stays_fetch() {
        let err: InstallError = FetchError::Io(std::io::Error::other("disk full")).into();
        assert!(matches!(err, InstallError::Fetch(_)));
    }
}
