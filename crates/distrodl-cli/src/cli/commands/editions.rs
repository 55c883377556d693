//! `distrodl editions <distribution>` – editions of one distribution.

use anyhow::{bail, Result};
use distrodl_core::catalog::Catalog;

pub fn run_editions(catalog: &Catalog, distribution: &str) -> Result<()> {
    let Some(distro) = catalog.distribution(distribution) else {
        bail!(
            "unknown distribution {:?} (known: {})",
            distribution,
            catalog.distributions().join(", ")
        );
    };
    if !distro.description.is_empty() {
        println!("{}\n", distro.description);
    }
    for (name, entry) in &distro.editions {
        println!("{:<24} {}", name, entry.filename);
    }
    Ok(())
}
