//! Filesystem layout under the keg home directory.

use dirs::home_dir;
use std::path::PathBuf;

/// Returns the primary keg directory, or None if the user's home cannot be resolved.
pub fn try_keg_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("KEG_HOME") {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".keg"))
}

/// Returns the canonical keg home directory (`~/.keg`).
///
/// # Panics
///
/// Panics if neither `KEG_HOME` is set nor the user's home directory can be
/// resolved.
pub fn keg_home() -> PathBuf {
    try_keg_home().expect("Could not determine home directory. Set KEG_HOME to override.")
}

/// Built package store: ~/.keg/store/<name>/<version>
pub fn store_path() -> PathBuf {
    keg_home().join("store")
}

/// Symlink target for installed binaries: ~/.keg/bin
pub fn bin_path() -> PathBuf {
    keg_home().join("bin")
}

/// Downloaded archives, keyed by digest: ~/.keg/cache
pub fn cache_path() -> PathBuf {
    keg_home().join("cache")
}

/// Build logs directory: ~/.keg/logs
pub fn log_dir() -> PathBuf {
    keg_home().join("logs")
}

/// Temp path: ~/.keg/tmp (guaranteed same volume as store)
pub fn tmp_path() -> PathBuf {
    keg_home().join("tmp")
}

/// Generate a build log path for a formula
pub fn build_log_path(name: &str, version: &str) -> PathBuf {
    let timestamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
    log_dir().join(format!("build-{name}-{version}-{timestamp}.log"))
}
