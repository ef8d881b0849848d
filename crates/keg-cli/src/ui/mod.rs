//! Console output for keg commands.

mod output;

pub use output::{ConsoleReporter, Output, format_size};
