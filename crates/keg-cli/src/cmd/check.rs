//! Check command

use std::path::Path;

use anyhow::{Context as _, Result};
use keg_core::formula::Formula;

use crate::ui::Output;

/// Validate a formula file without installing it.
pub fn check(path: &Path) -> Result<()> {
    let output = Output::new();

    let formula = Formula::from_file(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    formula.validate()?;

    output.success(&format!(
        "{} {} is a valid formula",
        formula.package.name, formula.package.version
    ));
    output.info(&format!("source   {}", formula.source.url));
    output.info(&format!("sha256   {}", formula.source.sha256));
    if !formula.build.dependencies.is_empty() {
        output.info(&format!(
            "requires {}",
            formula.build.dependencies.join(", ")
        ));
    }
    output.info(&format!(
        "checks   {}",
        formula.effective_checks().len()
    ));

    Ok(())
}
