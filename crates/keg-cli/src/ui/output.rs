//! Plain line-oriented console output.
//!
//! keg's per-install output is a handful of lines, so everything prints
//! directly; the only in-place update is the download progress line.

use std::io::Write;

use crossterm::style::Stylize;
use keg_core::Reporter;
use keg_schema::{FormulaName, Version};

/// Handle for user-facing console messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output;

impl Output {
    /// Create a new output handle.
    pub fn new() -> Self {
        Self
    }

    /// Prints a visual section header for an operation phase.
    pub fn section(&self, title: &str) {
        println!("{}", title.white().bold());
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        println!("  {msg}");
    }

    /// Log a success message.
    pub fn success(&self, msg: &str) {
        println!("  {} {msg}", "OK".green());
    }

    /// Log a warning message.
    pub fn warning(&self, msg: &str) {
        eprintln!("  {} {msg}", "warning:".yellow());
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "error:".red());
    }
}

/// [`Reporter`] implementation that prints progress to the console.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    /// Create a new console reporter.
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for ConsoleReporter {
    fn section(&self, title: &str) {
        println!("{}", title.white().bold());
    }

    fn downloading(&self, name: &FormulaName, version: &Version, current: u64, total: Option<u64>) {
        match total {
            Some(total) if total > 0 => {
                let pct = (current * 100) / total;
                print!(
                    "\r  {} {name} {version} {} ({pct:>3}%)",
                    "fetching".cyan(),
                    format_size(current).dark_grey(),
                );
            }
            _ => {
                print!(
                    "\r  {} {name} {version} {}",
                    "fetching".cyan(),
                    format_size(current).dark_grey(),
                );
            }
        }
        std::io::stdout().flush().ok();
    }

    fn building(&self, name: &FormulaName, version: &Version) {
        println!("\r  {} {name} {version}", "building".cyan());
    }

    fn done(&self, name: &FormulaName, version: &Version, detail: &str) {
        println!("  {} {name} {version} {}", "OK".green(), detail.dark_grey());
    }

    fn failed(&self, name: &FormulaName, version: &Version, reason: &str) {
        eprintln!("\r  {} {name} {version}: {reason}", "FAIL".red());
    }

    fn info(&self, msg: &str) {
        println!("  {msg}");
    }

    fn warning(&self, msg: &str) {
        eprintln!("  {} {msg}", "warning:".yellow());
    }
}

/// Render a byte count as a short human-readable size.
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;

    match bytes {
        0..KIB => format!("{bytes} B"),
        KIB..MIB => format!("{:.1} KiB", bytes as f64 / KIB as f64),
        MIB..GIB => format!("{:.1} MiB", bytes as f64 / MIB as f64),
        _ => format!("{:.1} GiB", bytes as f64 / GIB as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MiB");
    }
}
