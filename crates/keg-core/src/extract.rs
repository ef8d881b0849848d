//! Post-extraction normalization.

use std::io;
use std::path::Path;

/// Hoist the contents of a single top-level directory up one level.
///
/// GitHub tag archives unpack to `<name>-<tag>/...`; build scripts expect
/// the source root directly. When the extracted tree has exactly one entry
/// and it is a directory, its children are moved up and the wrapper removed.
/// Any other shape is left untouched.
pub fn strip_components(dir: &Path) -> io::Result<()> {
    let entries: Vec<_> = std::fs::read_dir(dir)?.collect::<Result<_, _>>()?;

    let [single] = entries.as_slice() else {
        return Ok(());
    };
    if !single.file_type()?.is_dir() {
        return Ok(());
    }

    let wrapper = single.path();
    for child in std::fs::read_dir(&wrapper)? {
        let child = child?;
        let target = dir.join(child.file_name());
        std::fs::rename(child.path(), target)?;
    }
    std::fs::remove_dir(&wrapper)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_strip_single_wrapper_dir() {
        let tmp = tempdir().unwrap();
        let wrapper = tmp.path().join("work-tuimer-0.3.0");
        std::fs::create_dir_all(wrapper.join("src")).unwrap();
        std::fs::write(wrapper.join("Cargo.toml"), "[package]").unwrap();
        std::fs::write(wrapper.join("src/main.rs"), "fn main() {}").unwrap();

        strip_components(tmp.path()).unwrap();

        assert!(tmp.path().join("Cargo.toml").exists());
        assert!(tmp.path().join("src/main.rs").exists());
        assert!(!wrapper.exists());
    }

    #[test]
    fn test_leaves_flat_tree_alone() {
        let tmp = tempdir().unwrap();
        std::fs::write(tmp.path().join("a.txt"), "a").unwrap();
        std::fs::write(tmp.path().join("b.txt"), "b").unwrap();

        strip_components(tmp.path()).unwrap();

        assert!(tmp.path().join("a.txt").exists());
        assert!(tmp.path().join("b.txt").exists());
    }

    #[test]
    fn test_leaves_single_file_alone() {
        let tmp = tempdir().unwrap();
        std::fs::write(tmp.path().join("only.bin"), "x").unwrap();

        strip_components(tmp.path()).unwrap();

        assert!(tmp.path().join("only.bin").exists());
    }
}
