//! Installation Flow Typestate Pattern
//!
//! Models the install pipeline as a series of explicit state transitions:
//!
//! ```text
//! UnresolvedFormula --[resolve()]--> ResolvedFormula --[fetch()]--> FetchedFormula
//! ```
//!
//! This enforces at compile-time that you cannot build a formula before its
//! archive has been fetched and its digest verified, preventing logic
//! errors where code attempts to run a build script for an archive that
//! failed the integrity check.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use keg_core::Reporter;
use keg_core::fetch::FetchRequest;
use keg_core::formula::Formula;
use keg_schema::{FormulaName, Version};
use reqwest::Client;

use crate::ops::InstallError;

/// State 1: a formula file that has been named but not yet read.
///
/// # Transitions
///
/// - [`resolve()`](Self::resolve) -> [`ResolvedFormula`]
#[derive(Debug)]
pub struct UnresolvedFormula {
    /// Path to the formula file on disk.
    pub path: PathBuf,
}

/// State 2: a parsed, validated formula.
///
/// At this stage we know exactly what to download, the expected digest, and
/// how the result will be built and verified.
///
/// # Transitions
///
/// - [`fetch()`](Self::fetch) -> [`FetchedFormula`]
#[derive(Debug)]
pub struct ResolvedFormula {
    /// The formula name.
    pub name: FormulaName,
    /// The version this formula packages.
    pub version: Version,
    /// Full parsed formula.
    pub formula: Formula,
}

/// State 3: the source archive has been fetched, digest-verified, and
/// extracted. Ready for dependency resolution and build.
#[derive(Debug)]
pub struct FetchedFormula {
    /// The resolved formula.
    pub resolved: ResolvedFormula,
    /// Root of the extracted source tree.
    pub source_path: PathBuf,
    /// Temporary directory (cleaned up on drop).
    pub temp_dir: TempDir,
}

impl UnresolvedFormula {
    /// Create a new unresolved formula request.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read and validate the formula file.
    pub fn resolve(self) -> Result<ResolvedFormula, InstallError> {
        let formula = Formula::from_file(&self.path)?;
        formula.validate()?;

        Ok(ResolvedFormula {
            name: formula.package.name.clone(),
            version: formula.package.version.clone(),
            formula,
        })
    }
}

impl ResolvedFormula {
    /// The store entry this formula installs into.
    pub fn store_entry(&self) -> PathBuf {
        keg_core::paths::store_path()
            .join(&self.name)
            .join(&self.version)
    }

    /// Download the source archive, verify its digest, and extract it.
    ///
    /// The raw archive lands in the cache (keyed by digest); the extracted
    /// tree lives in a scratch temp dir that is discarded if any later
    /// stage fails.
    pub async fn fetch<R: Reporter>(
        self,
        client: &Client,
        reporter: &R,
    ) -> Result<FetchedFormula, InstallError> {
        let tmp_root = keg_core::paths::tmp_path();
        std::fs::create_dir_all(&tmp_root)?;
        let temp_dir = tempfile::Builder::new()
            .prefix("keg-")
            .tempdir_in(tmp_root)?;

        let cache_file = keg_core::paths::cache_path().join(self.formula.source.sha256.as_str());
        if let Some(parent) = cache_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let extract_dir = temp_dir.path().join("src");
        std::fs::create_dir_all(&extract_dir)?;

        FetchRequest::new(
            client,
            &self.name,
            &self.version,
            &self.formula.source.url,
            &cache_file,
            &self.formula.source.sha256,
            reporter,
        )
        .with_extract_dest(&extract_dir)
        .execute()
        .await?;

        // GitHub tag archives wrap everything in a <name>-<tag>/ directory.
        keg_core::extract::strip_components(&extract_dir)?;

        Ok(FetchedFormula {
            resolved: self,
            source_path: extract_dir,
            temp_dir,
        })
    }
}

impl FetchedFormula {
    /// Path the build stage installs into before the result is committed
    /// to the store.
    pub fn staging_prefix(&self) -> PathBuf {
        self.temp_dir.path().join("prefix")
    }

    /// Root of the extracted source tree.
    pub fn source(&self) -> &Path {
        &self.source_path
    }
}
