//! Post-install smoke verification.
//!
//! Runs the installed binary with each check's arguments and asserts the
//! expected substring is present on stdout. These are presence checks only:
//! the command must succeed and the literal substring must appear. No exit
//! code interpretation beyond that, no structured output parsing.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use thiserror::Error;
use wait_timeout::ChildExt;

use crate::formula::SmokeCheck;

/// How long a single smoke check may run before it counts as failed.
/// A `--version` call that hangs is as broken as one that prints nothing.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors surfaced by the verification stage.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// The installed binary could not be spawned or its output read.
    #[error("Failed to run installed binary: {0}")]
    Io(#[from] std::io::Error),

    /// The check ran past its timeout and was killed.
    #[error("`{command}` did not finish within {timeout_secs}s")]
    Timeout {
        /// The command line that was run.
        command: String,
        /// The timeout that was exceeded, in seconds.
        timeout_secs: u64,
    },

    /// The check command exited non-zero.
    #[error("`{command}` exited with code {code:?}")]
    CommandFailed {
        /// The command line that was run.
        command: String,
        /// Exit code, if the process terminated normally.
        code: Option<i32>,
    },

    /// The expected substring was absent from the check's stdout.
    #[error("`{command}` output did not contain {expected:?}")]
    MissingOutput {
        /// The command line that was run.
        command: String,
        /// The substring that was expected.
        expected: String,
    },
}

/// Run every smoke check in order, stopping at the first failure.
pub fn run_checks(
    bin: &Path,
    checks: &[SmokeCheck],
    timeout: Duration,
) -> Result<(), VerifyError> {
    for check in checks {
        run_check(bin, check, timeout)?;
    }
    Ok(())
}

/// Run a single smoke check, returning the captured stdout on success.
pub fn run_check(
    bin: &Path,
    check: &SmokeCheck,
    timeout: Duration,
) -> Result<String, VerifyError> {
    let command = display_command(bin, &check.args);

    let mut child = Command::new(bin)
        .args(&check.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    let Some(status) = child.wait_timeout(timeout)? else {
        child.kill().ok();
        child.wait().ok();
        return Err(VerifyError::Timeout {
            command,
            timeout_secs: timeout.as_secs(),
        });
    };

    let mut stdout = String::new();
    if let Some(mut pipe) = child.stdout.take() {
        pipe.read_to_string(&mut stdout)?;
    }

    if !status.success() {
        return Err(VerifyError::CommandFailed {
            command,
            code: status.code(),
        });
    }

    if !stdout.contains(&check.expect) {
        return Err(VerifyError::MissingOutput {
            command,
            expected: check.expect.clone(),
        });
    }

    Ok(stdout)
}

fn display_command(bin: &Path, args: &[String]) -> String {
    let name = bin
        .file_name()
        .map_or_else(|| bin.display().to_string(), |n| n.to_string_lossy().into());
    if args.is_empty() {
        name
    } else {
        format!("{name} {}", args.join(" "))
    }
}
