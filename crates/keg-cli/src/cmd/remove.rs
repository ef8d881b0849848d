//! Remove command

use anyhow::Result;

use crate::ops::remove::remove_formula;
use crate::ui::Output;

/// Remove an installed formula.
pub fn remove(name: &str, dry_run: bool) -> Result<()> {
    let output = Output::new();
    remove_formula(name, dry_run, &output)
}
