//! Formula installation.
//!
//! The main entry point is [`install_formula`], which runs the linear
//! pipeline:
//!
//! ```text
//! resolve -> fetch + verify digest -> resolve build deps -> build
//!         -> commit to store -> link binaries -> smoke-test
//! ```
//!
//! Every stage is terminal: the first failure aborts the install and
//! nothing later runs. Dependency resolution strictly precedes the build,
//! which strictly precedes verification. There is no retry or rollback;
//! a failed install leaves only the scratch temp dir, which is dropped.

use std::path::{Path, PathBuf};

use keg_core::Reporter;
use keg_core::builder::{Builder, resolve_build_deps};
use keg_core::formula::Formula;
use keg_core::receipt::{Receipt, dir_size};
use keg_core::smoke::{DEFAULT_CHECK_TIMEOUT, run_checks};
use keg_schema::FormulaName;

use crate::ops::flow::UnresolvedFormula;
use crate::ops::{Context, InstallError, link_binaries};
use crate::ui::format_size;

/// Resolve, fetch, build, link, and smoke-test one formula.
pub async fn install_formula(
    ctx: &Context,
    formula_path: &Path,
    dry_run: bool,
    verbose: bool,
) -> Result<(), InstallError> {
    let resolved = UnresolvedFormula::new(formula_path).resolve()?;
    let name = resolved.name.clone();
    let version = resolved.version.clone();
    let store_entry = resolved.store_entry();

    // Re-installing an identical version is a no-op: the store entry and
    // its links are left untouched, and the smoke checks are re-asserted
    // to confirm the installed binary still behaves.
    if let Some(receipt) = Receipt::load_from(&store_entry)? {
        if receipt.sha256 == resolved.formula.source.sha256 {
            ctx.reporter.done(&name, &version, "already installed");
            if !dry_run {
                let bin = installed_bin(&resolved.formula, &name);
                run_checks(
                    &bin,
                    &resolved.formula.effective_checks(),
                    DEFAULT_CHECK_TIMEOUT,
                )?;
            }
            perform_ux_checks(&name, &ctx.reporter);
            return Ok(());
        }
    }

    if dry_run {
        ctx.reporter
            .info(&format!("Would fetch {}", resolved.formula.source.url));
        ctx.reporter.info(&format!(
            "Would verify sha256 {}",
            resolved.formula.source.sha256
        ));
        ctx.reporter
            .info(&format!("Would build with `{}`", resolved.formula.build_script()));
        ctx.reporter
            .info(&format!("Would install into {}", store_entry.display()));
        return Ok(());
    }

    // Fetch + integrity. The digest check happens inside the streaming
    // download; a mismatch surfaces as InstallError::Integrity.
    let fetched = resolved.fetch(&ctx.client, &ctx.reporter).await?;
    let formula = &fetched.resolved.formula;

    // Build-time tools must resolve before the build script runs.
    let tools = resolve_build_deps(&formula.build.dependencies)?;

    ctx.reporter.building(&name, &version);
    let log_path = keg_core::paths::build_log_path(&name, &version);
    tracing::debug!(log = %log_path.display(), "running build script");
    let staging = fetched.staging_prefix();
    Builder::new(tools).verbose(verbose).build(
        fetched.source(),
        formula.build_script(),
        &staging,
        &log_path,
    )?;

    commit_to_store(&staging, &store_entry)?;

    let bins = formula.install.effective_bin(&name);
    let files = link_binaries(&bins, &store_entry, &keg_core::paths::bin_path())?;

    let size = dir_size(&store_entry);
    Receipt::new(
        name.clone(),
        version.clone(),
        formula.source.sha256.clone(),
        size,
        files.clone(),
    )
    .write_to(&store_entry)?;

    // Post-install smoke checks run against the linked binary, exactly as
    // a user would invoke it.
    let bin = PathBuf::from(&files[0]);
    run_checks(&bin, &formula.effective_checks(), DEFAULT_CHECK_TIMEOUT)?;

    ctx.reporter.done(&name, &version, &format_size(size));
    perform_ux_checks(&name, &ctx.reporter);

    Ok(())
}

/// Move the staged `$PREFIX` tree into its store entry.
///
/// Rename is atomic and instant when staging and store share a volume
/// (they do: both live under the keg home); fall back to a copy otherwise.
fn commit_to_store(staging: &Path, store_entry: &Path) -> Result<(), InstallError> {
    if store_entry.exists() {
        std::fs::remove_dir_all(store_entry)?;
    }
    if let Some(parent) = store_entry.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if std::fs::rename(staging, store_entry).is_err() {
        copy_dir_all(staging, store_entry)?;
    }
    Ok(())
}

fn copy_dir_all(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Where the first declared binary of a formula is linked.
fn installed_bin(formula: &Formula, name: &FormulaName) -> PathBuf {
    let bins = formula.install.effective_bin(name);
    let target_name = Path::new(&bins[0])
        .file_name()
        .map_or_else(|| bins[0].clone(), |n| n.to_string_lossy().to_string());
    keg_core::paths::bin_path().join(target_name)
}

/// Warn when the keg bin directory is not on `PATH`, or when the installed
/// name is shadowed by another binary earlier on `PATH`.
pub fn perform_ux_checks(name: &FormulaName, reporter: &impl Reporter) {
    let path_env = std::env::var_os("PATH").unwrap_or_default();
    let bin_dir = keg_core::paths::bin_path();
    let is_in_path = std::env::split_paths(&path_env).any(|p| p == bin_dir);

    if !is_in_path {
        reporter.warning(&format!("{} is not in your PATH.", bin_dir.display()));
        reporter.info(&format!(
            "Add this to your shell profile: export PATH=\"{}:$PATH\"",
            bin_dir.display()
        ));
    }

    if let Ok(path) = which::which(name) {
        if !path.starts_with(&bin_dir) {
            reporter.warning(&format!(
                "'{}' is shadowed by system version at {}",
                name,
                path.display()
            ));
        }
    }
}
