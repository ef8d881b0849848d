//! keg - a formula runner
//!
//! Fast, minimal installer for CLI tools built from source.
//!
//! # Overview
//!
//! keg consumes declarative TOML formulas: a source URL, a SHA-256 digest,
//! the build-time tools the build needs, and a couple of smoke checks
//! against the installed binary. `keg install` runs the whole pipeline:
//! *resolve -> fetch+verify -> resolve build deps -> build -> link ->
//! smoke-test*, failing terminally at the first broken stage.
//!
//! # Architecture
//!
//! - **Typestate Pattern**: the install flow uses `UnresolvedFormula` ->
//!   `ResolvedFormula` -> `FetchedFormula` to enforce correct ordering at
//!   compile time.
//! - **Newtypes**: `FormulaName`, `Version`, and `Sha256Digest` provide
//!   type-safe identifiers.
//!
//! # Directory Layout
//!
//! ```text
//! ~/.keg/
//! ├── bin/        # Symlinks to installed binaries
//! ├── store/      # Built artifacts by name/version (with receipts)
//! ├── cache/      # Downloaded archives (by digest)
//! ├── logs/       # Build logs
//! └── tmp/        # Scratch space (same volume as store)
//! ```

pub mod cmd;
pub mod ops;
pub mod ui;

pub use keg_core::formula::{self, Formula};
pub use keg_core::paths::*;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Extract the filename from a URL.
///
/// # Example
///
/// ```
/// use keg_cli::filename_from_url;
///
/// assert_eq!(filename_from_url("https://example.com/path/to/file.tar.gz"), "file.tar.gz");
/// assert_eq!(filename_from_url(""), "");
/// ```
pub fn filename_from_url(url: &str) -> &str {
    url.split('/').next_back().unwrap_or("")
}

/// Top-level command-line interface.
#[derive(Debug, Parser)]
#[command(name = "keg")]
#[command(author, version, about = "keg - a formula runner for source-built CLI tools")]
pub struct Cli {
    /// Show what would happen without making changes
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// All keg subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install a formula
    Install {
        /// Path to the formula file
        formula: PathBuf,
        /// Stream build output to the terminal instead of the log file
        #[arg(short, long)]
        verbose: bool,
    },
    /// Validate a formula file without installing it
    Check {
        /// Path to the formula file
        formula: PathBuf,
    },
    /// Show info about a formula file or an installed formula
    Info {
        /// Formula file path or installed formula name
        target: String,
    },
    /// List installed formulas
    List,
    /// Remove an installed formula
    Remove {
        /// Formula name
        name: String,
    },
    /// Compute SHA256 digest of files (for formula authoring)
    #[command(hide = true)]
    Hash {
        /// Files to hash
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}
