//! `distrodl validate` – report every catalog problem, exit 1 if any entry is unusable.

use anyhow::Result;
use distrodl_core::catalog::Catalog;
use std::path::Path;

pub fn run_validate(path: &Path) -> Result<i32> {
    let load = Catalog::load(path)?;
    for issue in &load.issues {
        println!("{}", issue);
    }
    let stats = load.catalog.stats();
    let errors = load.errors().count();
    let warnings = load.warnings().count();
    println!(
        "{}: {} distribution(s), {} edition(s), {} error(s), {} warning(s)",
        path.display(),
        stats.distributions,
        stats.editions,
        errors,
        warnings
    );
    Ok(if errors > 0 { 1 } else { 0 })
}
