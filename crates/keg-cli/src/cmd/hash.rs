//! Hash command (formula authoring aid)

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

/// Compute and print the SHA256 digest of each file, in the form a
/// formula's `source.sha256` field expects.
pub fn hash(files: &[PathBuf]) -> Result<()> {
    for path in files {
        let mut file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 8192];
        loop {
            let count = file.read(&mut buffer)?;
            if count == 0 {
                break;
            }
            hasher.update(&buffer[..count]);
        }

        println!("{}  {}", hex::encode(hasher.finalize()), path.display());
    }

    Ok(())
}
