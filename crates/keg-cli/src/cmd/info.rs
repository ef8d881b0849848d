//! Info command

use anyhow::{Result, bail};
use crossterm::style::Stylize;
use keg_core::formula::Formula;
use keg_core::receipt::Receipt;
use keg_schema::FormulaName;

use crate::ui::format_size;

/// Show info about a formula file or an installed formula.
///
/// `target` is tried as a file path first; otherwise it is looked up in
/// the store by name.
pub fn info(target: &str) -> Result<()> {
    let path = std::path::Path::new(target);
    if path.exists() {
        return info_from_file(path);
    }
    info_from_store(&FormulaName::new(target))
}

fn info_from_file(path: &std::path::Path) -> Result<()> {
    let formula = Formula::from_file(path)?;
    let lw = 12;

    println!();
    println!(
        "  {} {}",
        formula.package.name.as_str().white().bold(),
        formula.package.version.as_str().dark_grey()
    );
    if !formula.package.description.is_empty() {
        println!("  {}", formula.package.description);
    }
    println!();
    if !formula.package.homepage.is_empty() {
        println!("  {:<lw$}{}", "homepage", formula.package.homepage);
    }
    if !formula.package.license.is_empty() {
        println!("  {:<lw$}{}", "license", formula.package.license);
    }
    println!("  {:<lw$}{}", "source", formula.source.url);
    println!("  {:<lw$}{}", "sha256", formula.source.sha256);
    if !formula.build.dependencies.is_empty() {
        println!(
            "  {:<lw$}{}",
            "requires",
            formula.build.dependencies.join(", ")
        );
    }

    Ok(())
}

fn info_from_store(name: &FormulaName) -> Result<()> {
    let formula_dir = keg_core::paths::store_path().join(name);
    if !formula_dir.exists() {
        bail!("Formula '{name}' not found");
    }

    let lw = 12;
    for entry in std::fs::read_dir(&formula_dir)? {
        let entry = entry?;
        let Some(receipt) = Receipt::load_from(&entry.path())? else {
            continue;
        };

        let dt = chrono::DateTime::from_timestamp(receipt.installed_at, 0)
            .unwrap_or_default()
            .format("%Y-%m-%d")
            .to_string();

        println!();
        println!(
            "  {} {}",
            receipt.name.as_str().white().bold(),
            receipt.version.as_str().dark_grey()
        );
        println!();
        println!(
            "  {:<lw$}{}, {}",
            "installed",
            format_size(receipt.size_bytes),
            dt
        );
        println!("  {:<lw$}{}", "sha256", receipt.sha256);
    }

    Ok(())
}
