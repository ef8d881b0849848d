//! Install command

use std::path::Path;

use anyhow::Result;

use crate::ops::{self, Context};

/// Install a formula from a file path.
pub async fn install(formula: &Path, dry_run: bool, verbose: bool) -> Result<()> {
    let ctx = Context::new();

    ops::install::install_formula(&ctx, formula, dry_run, verbose)
        .await
        .map_err(Into::into)
}
