//! Install receipts.
//!
//! A receipt is written next to the built artifacts in the store after a
//! successful install. Its presence is the "already installed" signal that
//! makes re-installing an identical version a no-op, and its `files` list
//! drives uninstall.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use keg_schema::{FormulaName, Sha256Digest, Version};

/// Receipt file name inside a store entry.
pub const RECEIPT_FILE: &str = ".keg-receipt.json";

/// Errors that can occur when reading or writing a receipt.
#[derive(Error, Debug)]
pub enum ReceiptError {
    /// The receipt file could not be read or written.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The receipt file exists but is not valid JSON for this schema.
    #[error("Corrupt receipt: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Record of one completed install, serialized as JSON in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    /// Installed formula name.
    pub name: FormulaName,
    /// Installed version.
    pub version: Version,
    /// Digest of the source archive this install was built from.
    pub sha256: Sha256Digest,
    /// Total size of the store entry in bytes.
    pub size_bytes: u64,
    /// Unix timestamp of the install.
    pub installed_at: i64,
    /// Absolute paths of symlinks created outside the store entry.
    pub files: Vec<String>,
}

impl Receipt {
    /// Build a receipt for a just-completed install, stamped with now.
    pub fn new(
        name: FormulaName,
        version: Version,
        sha256: Sha256Digest,
        size_bytes: u64,
        files: Vec<String>,
    ) -> Self {
        Self {
            name,
            version,
            sha256,
            size_bytes,
            installed_at: chrono::Utc::now().timestamp(),
            files,
        }
    }

    /// Path of the receipt file inside a store entry.
    pub fn path_in(store_entry: &Path) -> PathBuf {
        store_entry.join(RECEIPT_FILE)
    }

    /// Write this receipt into the given store entry.
    pub fn write_to(&self, store_entry: &Path) -> Result<(), ReceiptError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(Self::path_in(store_entry), content)?;
        Ok(())
    }

    /// Load the receipt from a store entry, if one exists.
    pub fn load_from(store_entry: &Path) -> Result<Option<Self>, ReceiptError> {
        let path = Self::path_in(store_entry);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}

/// Total size in bytes of all files under a directory.
pub fn dir_size(path: &Path) -> u64 {
    walkdir::WalkDir::new(path)
        .into_iter()
        .flatten()
        .filter_map(|e| e.metadata().ok())
        .filter(std::fs::Metadata::is_file)
        .map(|m| m.len())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_receipt() -> Receipt {
        Receipt::new(
            FormulaName::from("work-tuimer"),
            Version::from("0.3.0"),
            Sha256Digest::parse(
                "468577cf23cab371261b2896568a539bb0bdbcdbaa0711c1653c17cb1949a6c3",
            )
            .unwrap(),
            1024,
            vec!["/home/user/.keg/bin/work-tuimer".to_string()],
        )
    }

    #[test]
    fn test_receipt_roundtrip() {
        let tmp = tempdir().unwrap();
        let receipt = sample_receipt();
        receipt.write_to(tmp.path()).unwrap();

        let loaded = Receipt::load_from(tmp.path()).unwrap().unwrap();
        assert_eq!(loaded.name, receipt.name);
        assert_eq!(loaded.version, receipt.version);
        assert_eq!(loaded.sha256, receipt.sha256);
        assert_eq!(loaded.files, receipt.files);
    }

    #[test]
    fn test_load_absent_receipt_is_none() {
        let tmp = tempdir().unwrap();
        assert!(Receipt::load_from(tmp.path()).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_receipt_is_an_error() {
        let tmp = tempdir().unwrap();
        std::fs::write(Receipt::path_in(tmp.path()), "{ not json").unwrap();
        assert!(matches!(
            Receipt::load_from(tmp.path()),
            Err(ReceiptError::Parse(_))
        ));
    }

    #[test]
    fn test_dir_size_sums_files() {
        let tmp = tempdir().unwrap();
        std::fs::write(tmp.path().join("a"), vec![0u8; 100]).unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        std::fs::write(tmp.path().join("sub/b"), vec![0u8; 50]).unwrap();

        assert_eq!(dir_size(tmp.path()), 150);
    }
}
