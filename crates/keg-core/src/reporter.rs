//! Progress reporting trait consumed by the pipeline stages.

use keg_schema::{FormulaName, Version};

/// Receives progress events from the install pipeline.
///
/// The CLI provides a console implementation; tests use [`NullReporter`].
pub trait Reporter: Send + Sync {
    /// Indicates a new pipeline stage has started (e.g. "Fetching", "Building").
    fn section(&self, title: &str);

    /// Updates the progress of a download.
    fn downloading(&self, name: &FormulaName, version: &Version, current: u64, total: Option<u64>);

    /// Indicates the build script is running.
    fn building(&self, name: &FormulaName, version: &Version);

    /// Marks a formula operation as successfully completed.
    fn done(&self, name: &FormulaName, version: &Version, detail: &str);

    /// Marks a formula operation as failed with a specific reason.
    fn failed(&self, name: &FormulaName, version: &Version, reason: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);
}

/// A reporter that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _title: &str) {}
    fn downloading(
        &self,
        _name: &FormulaName,
        _version: &Version,
        _current: u64,
        _total: Option<u64>,
    ) {
    }
    fn building(&self, _name: &FormulaName, _version: &Version) {}
    fn done(&self, _name: &FormulaName, _version: &Version, _detail: &str) {}
    fn failed(&self, _name: &FormulaName, _version: &Version, _reason: &str) {}
    fn info(&self, _msg: &str) {}
    fn warning(&self, _msg: &str) {}
}
