//! Shared state for install operations.

use crate::ui::ConsoleReporter;
use reqwest::Client;

/// Everything an install operation needs: one HTTP client and a progress
/// sink. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Context {
    /// HTTP client reused across fetches.
    pub client: Client,
    /// Progress reporter for pipeline events.
    pub reporter: ConsoleReporter,
}

impl Context {
    /// Build the default context.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            reporter: ConsoleReporter::new(),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
