//! Build orchestration for formula source builds.
//!
//! Runs the formula's build script with a sanitised environment: host
//! variables are cleared, and only the minimal set required for a
//! conventional `cargo install` style build is injected. Build-time
//! dependencies are resolved to concrete paths *before* the script runs, so
//! a missing toolchain fails the dependency stage, never the build stage.
//!
//! ## Environment contract
//!
//! Build scripts receive exactly these variables (nothing more):
//!
//! | Variable | Value |
//! |---|---|
//! | `PATH` | `/usr/bin:/bin:/usr/sbin:/sbin`, with each resolved build dependency's directory prepended |
//! | `HOME` | The source root (prevents reading host dotfiles) |
//! | `TERM` | `dumb` |
//! | `LANG` | `en_US.UTF-8` |
//! | `PREFIX` | Install destination for the build |
//! | `OUTPUT` | Same as `PREFIX` |
//! | `DESTDIR` | Empty string |
//! | `JOBS` | Logical CPU count |
//! | `SOURCE_DATE_EPOCH` | `0` (epoch zero for reproducible timestamps) |

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

/// Fixed epoch for `SOURCE_DATE_EPOCH`. Using zero (1970-01-01T00:00:00Z)
/// ensures embedded timestamps are identical across builds regardless of
/// when the build actually ran.
const SOURCE_DATE_EPOCH: &str = "0";

/// Lines of build log shown when a build fails.
const LOG_TAIL_LINES: usize = 20;

/// A build-time dependency could not be resolved on the host.
#[derive(Error, Debug)]
#[error("Missing build dependencies: {}", .missing.join(", "))]
pub struct DependencyError {
    /// Tools named by the formula that `which` could not find.
    pub missing: Vec<String>,
}

/// Errors surfaced by the build stage.
#[derive(Error, Debug)]
pub enum BuildError {
    /// Build scaffolding (log file, prefix dir) could not be set up.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The build script exited non-zero.
    #[error("Build script failed with exit code {code:?} (log: {})", .log_path.display())]
    Script {
        /// Exit code of the script, if the process terminated normally.
        code: Option<i32>,
        /// Full build log on disk.
        log_path: PathBuf,
        /// Last lines of the log, for immediate display.
        tail: String,
    },
}

/// A build-time tool resolved to its on-disk location.
#[derive(Debug, Clone)]
pub struct ResolvedTool {
    /// Tool name as declared in the formula.
    pub name: String,
    /// Absolute path `which` resolved the tool to.
    pub path: PathBuf,
}

/// Resolve every build-time dependency to a concrete path.
///
/// # Errors
///
/// Returns [`DependencyError`] listing every tool that could not be found.
/// Resolution happens strictly before the build runs.
pub fn resolve_build_deps(deps: &[String]) -> Result<Vec<ResolvedTool>, DependencyError> {
    let mut resolved = Vec::new();
    let mut missing = Vec::new();

    for dep in deps {
        match which::which(dep) {
            Ok(path) => resolved.push(ResolvedTool {
                name: dep.clone(),
                path,
            }),
            Err(_) => missing.push(dep.clone()),
        }
    }

    if missing.is_empty() {
        Ok(resolved)
    } else {
        Err(DependencyError { missing })
    }
}

/// Executes formula build scripts with the sanitised environment.
///
/// See the [module-level documentation](self) for the full environment
/// contract.
#[derive(Debug)]
pub struct Builder {
    tools: Vec<ResolvedTool>,
    verbose: bool,
}

impl Builder {
    /// Create a builder for the given resolved build-time tools.
    pub fn new(tools: Vec<ResolvedTool>) -> Self {
        Self {
            tools,
            verbose: false,
        }
    }

    /// Stream build output to the terminal instead of the log file.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Execute a build script against an extracted source tree.
    ///
    /// Runs `script` via `/bin/sh -c` with cwd = `source_dir` and the
    /// environment contract from the module docs. The script installs into
    /// `$PREFIX`, which is created before the run.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Script`] with the log tail when the script
    /// exits non-zero, or [`BuildError::Io`] when scaffolding fails.
    pub fn build(
        &self,
        source_dir: &Path,
        script: &str,
        prefix: &Path,
        log_path: &Path,
    ) -> Result<(), BuildError> {
        std::fs::create_dir_all(prefix)?;
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let prefix_abs = prefix.canonicalize()?;

        // Sanitised PATH: system toolchain directories plus the directory of
        // each resolved build dependency, so `cargo` and friends remain
        // reachable after env_clear.
        let mut path_dirs = vec![
            "/usr/bin".to_string(),
            "/bin".to_string(),
            "/usr/sbin".to_string(),
            "/sbin".to_string(),
        ];
        for tool in &self.tools {
            if let Some(dir) = tool.path.parent() {
                let dir = dir.to_string_lossy().to_string();
                if !path_dirs.contains(&dir) {
                    path_dirs.insert(0, dir);
                }
            }
        }

        let mut cmd = Command::new("/bin/sh");

        // Start from a blank slate so host env vars never leak in.
        cmd.env_clear();

        cmd.arg("-c")
            .arg(script)
            .current_dir(source_dir)
            // Minimal system
            .env("PATH", path_dirs.join(":"))
            .env("HOME", source_dir)
            .env("TERM", "dumb")
            .env("LANG", "en_US.UTF-8")
            // Install paths
            .env("PREFIX", &prefix_abs)
            .env("OUTPUT", &prefix_abs)
            .env("DESTDIR", "")
            .env("JOBS", num_cpus::get().to_string())
            // Reproducibility
            .env("SOURCE_DATE_EPOCH", SOURCE_DATE_EPOCH);

        let status = if self.verbose {
            cmd.status()?
        } else {
            use std::process::Stdio;
            let log_file = std::fs::File::create(log_path)?;
            cmd.stdout(Stdio::from(log_file.try_clone()?))
                .stderr(Stdio::from(log_file))
                .status()?
        };

        if !status.success() {
            let tail = if self.verbose {
                String::new()
            } else {
                read_last_lines(log_path, LOG_TAIL_LINES).unwrap_or_default()
            };
            if !tail.is_empty() {
                eprintln!("\nBuild failed. Last {LOG_TAIL_LINES} lines:");
                eprintln!("{tail}");
                eprintln!("\nFull log: {}", log_path.display());
            }
            return Err(BuildError::Script {
                code: status.code(),
                log_path: log_path.to_path_buf(),
                tail,
            });
        }

        Ok(())
    }
}

/// Read the last N lines from a file efficiently.
///
/// Instead of loading the entire file, we seek to near the end and read a
/// fixed-size tail buffer. This prevents OOM on large build logs.
fn read_last_lines(path: &Path, n: usize) -> std::io::Result<String> {
    use std::fs::File;
    use std::io::{Read, Seek, SeekFrom};

    // Read at most 16KB from the end (enough for ~400 lines at 40 chars each)
    const TAIL_SIZE: u64 = 16 * 1024;

    let mut file = File::open(path)?;
    let file_len = file.metadata()?.len();

    let seek_pos = file_len.saturating_sub(TAIL_SIZE);
    file.seek(SeekFrom::Start(seek_pos))?;

    let mut buffer = String::new();
    file.read_to_string(&mut buffer)?;

    // If we seeked mid-file, skip the first (partial) line in-place
    let content = if seek_pos > 0 {
        buffer
            .find('\n')
            .map_or(buffer.as_str(), |idx| &buffer[idx + 1..])
    } else {
        &buffer
    };

    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..].join("\n"))
}
