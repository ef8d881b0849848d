//! Install pipeline operations.

pub mod context;
pub mod error;
pub mod flow;
pub mod install;
pub mod remove;

pub use context::Context;
pub use error::InstallError;

use std::path::Path;

/// Shared utility to link binaries from a formula's store entry into the
/// global bin directory. Returns the absolute paths of the created
/// symlinks, in `bin_list` order.
pub fn link_binaries(
    bin_list: &[String],
    store_entry: &Path,
    bin_dir: &Path,
) -> Result<Vec<String>, InstallError> {
    let mut created = Vec::new();

    std::fs::create_dir_all(bin_dir)?;

    for bin_spec in bin_list {
        let src_path = store_entry.join(bin_spec);
        if !src_path.exists() {
            return Err(InstallError::Validation(format!(
                "built output is missing declared binary: {bin_spec}"
            )));
        }

        let target_name = Path::new(bin_spec)
            .file_name()
            .map_or_else(|| bin_spec.clone(), |n| n.to_string_lossy().to_string());
        let target = bin_dir.join(target_name);

        if target.exists() || target.is_symlink() {
            std::fs::remove_file(&target)?;
        }

        #[cfg(unix)]
        std::os::unix::fs::symlink(&src_path, &target)?;
        #[cfg(not(unix))]
        std::fs::copy(&src_path, &target)?;

        created.push(target.to_string_lossy().to_string());
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_link_binaries_creates_symlinks() {
        let store = tempdir().unwrap();
        let bin = tempdir().unwrap();
        std::fs::create_dir_all(store.path().join("bin")).unwrap();
        std::fs::write(store.path().join("bin/tool"), "#!/bin/sh\n").unwrap();

        let created = link_binaries(&["bin/tool".to_string()], store.path(), bin.path()).unwrap();

        assert_eq!(created.len(), 1);
        let link = bin.path().join("tool");
        assert!(link.is_symlink() || link.exists());
    }

    #[test]
    fn test_link_binaries_replaces_existing_link() {
        let store = tempdir().unwrap();
        let bin = tempdir().unwrap();
        std::fs::create_dir_all(store.path().join("bin")).unwrap();
        std::fs::write(store.path().join("bin/tool"), "new").unwrap();
        std::fs::write(bin.path().join("tool"), "stale").unwrap();

        link_binaries(&["bin/tool".to_string()], store.path(), bin.path()).unwrap();

        let resolved = std::fs::read_to_string(bin.path().join("tool")).unwrap();
        assert_eq!(resolved, "new");
    }

    #[test]
    fn test_link_binaries_rejects_missing_binary() {
        let store = tempdir().unwrap();
        let bin = tempdir().unwrap();

        let err =
            link_binaries(&["bin/ghost".to_string()], store.path(), bin.path()).unwrap_err();
        assert!(matches!(err, InstallError::Validation(_)));
    }
}
