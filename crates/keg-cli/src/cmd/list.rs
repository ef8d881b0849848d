//! List command

use anyhow::Result;
use crossterm::style::Stylize;
use keg_core::receipt::Receipt;

use crate::ui::format_size;

/// List installed formulas, one line per version.
pub fn list() -> Result<()> {
    let store = keg_core::paths::store_path();
    if !store.exists() {
        println!("  Nothing installed.");
        return Ok(());
    }

    let mut receipts = Vec::new();
    for formula_dir in std::fs::read_dir(&store)? {
        let formula_dir = formula_dir?;
        if !formula_dir.path().is_dir() {
            continue;
        }
        for version_dir in std::fs::read_dir(formula_dir.path())? {
            let version_dir = version_dir?;
            if let Some(receipt) = Receipt::load_from(&version_dir.path())? {
                receipts.push(receipt);
            }
        }
    }

    if receipts.is_empty() {
        println!("  Nothing installed.");
        return Ok(());
    }

    receipts.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.version.cmp(&b.version)));

    for receipt in receipts {
        println!(
            "  {} {} {}",
            receipt.name.as_str().white().bold(),
            receipt.version.as_str().dark_grey(),
            format_size(receipt.size_bytes).dark_grey()
        );
    }

    Ok(())
}
