//! Receipt-driven uninstall.

use anyhow::{Result, bail};
use keg_core::receipt::Receipt;
use keg_schema::FormulaName;

use crate::ui::Output;

/// Remove every installed version of a formula: its symlinks first, then
/// the store entries.
pub fn remove_formula(name_str: &str, dry_run: bool, output: &Output) -> Result<()> {
    let name = FormulaName::new(name_str);
    let formula_dir = keg_core::paths::store_path().join(&name);

    if !formula_dir.exists() {
        bail!("'{name}' is not installed");
    }

    for entry in std::fs::read_dir(&formula_dir)? {
        let entry = entry?;
        let store_entry = entry.path();
        if !store_entry.is_dir() {
            continue;
        }

        let version = entry.file_name().to_string_lossy().to_string();
        if dry_run {
            output.info(&format!("Would remove {name} {version}"));
            continue;
        }

        if let Some(receipt) = Receipt::load_from(&store_entry)? {
            for file in &receipt.files {
                let path = std::path::Path::new(file);
                if path.is_symlink() || path.exists() {
                    std::fs::remove_file(path).ok();
                }
            }
        }

        std::fs::remove_dir_all(&store_entry)?;
        output.success(&format!("Removed {name} {version}"));
    }

    if !dry_run {
        // Drop the now-empty formula directory; ignore if something was left.
        std::fs::remove_dir(&formula_dir).ok();
    }

    Ok(())
}
