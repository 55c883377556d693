//! `distrodl catalog-add` – add or replace an edition in the catalog file.
//!
//! Stricter than loading: the URL must be http(s) and the checksum exactly
//! 64 hex characters. Checksums are stored lowercase.

use anyhow::{bail, Context, Result};
use distrodl_core::catalog::{
    is_http_url, is_sha256_hex, is_valid_filename, Catalog, CatalogEntry, CatalogError, Distribution,
};
use std::path::Path;

/// Arguments of one `catalog-add` call.
#[derive(Debug, Clone)]
pub struct NewEdition {
    pub distribution: String,
    pub description: Option<String>,
    pub edition: String,
    pub filename: String,
    pub url: String,
    pub checksum: String,
}

pub fn run_catalog_add(path: &Path, new: NewEdition) -> Result<()> {
    let mut catalog = match Catalog::load(path) {
        Ok(load) => {
            if let Some(first) = load.errors().next() {
                bail!(
                    "{} has invalid entries that would be lost on save (first: {}); run `distrodl validate`",
                    path.display(),
                    first
                );
            }
            load.catalog
        }
        Err(CatalogError::NotFound(_)) => {
            tracing::info!(path = %path.display(), "creating new catalog");
            Catalog::new()
        }
        Err(e) => return Err(e.into()),
    };

    let (distribution, edition) = (new.distribution.clone(), new.edition.clone());
    add_edition(&mut catalog, new)?;
    catalog
        .save(path)
        .with_context(|| format!("saving {}", path.display()))?;
    println!("Saved {} / {} to {}", distribution, edition, path.display());
    Ok(())
}

/// Validate `new` and merge it into `catalog`.
pub(crate) fn add_edition(catalog: &mut Catalog, new: NewEdition) -> Result<()> {
    let distribution = new.distribution.trim();
    let edition = new.edition.trim();
    if distribution.is_empty() || edition.is_empty() {
        bail!("distribution and edition names must not be empty");
    }
    let filename = new.filename.trim();
    if !is_valid_filename(filename) {
        bail!("invalid filename {:?}", new.filename);
    }
    let url = new.url.trim();
    if !is_http_url(url) {
        bail!("invalid URL {:?}: must be an http or https URL", new.url);
    }
    let checksum = new.checksum.trim().to_lowercase();
    if !is_sha256_hex(&checksum) {
        bail!("invalid checksum: expected 64 hexadecimal characters");
    }

    let mut distro = match (catalog.distribution(distribution), new.description) {
        (Some(existing), None) => existing.clone(),
        (Some(existing), Some(desc)) => Distribution {
            description: desc,
            ..existing.clone()
        },
        (None, Some(desc)) => Distribution::new(desc),
        (None, None) => bail!("--description is required for new distribution {:?}", distribution),
    };
    distro.insert_edition(
        edition.to_string(),
        CatalogEntry {
            filename: filename.to_string(),
            url: url.to_string(),
            checksum,
        },
    );
    catalog.upsert_distribution(distribution, distro);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUM: &str = "DFFD6021BB2BD5B0AF676290809EC3A53191DD81C7F70A4B28688A362182986F";

    fn new_edition(distribution: &str, edition: &str) -> NewEdition {
        NewEdition {
            distribution: distribution.to_string(),
            description: Some("Popular desktop distribution".to_string()),
            edition: edition.to_string(),
            filename: "ubuntu.iso".to_string(),
            url: "https://releases.ubuntu.com/ubuntu.iso".to_string(),
            checksum: SUM.to_string(),
        }
    }

    #[test]
    fn adds_new_distribution_with_lowercase_checksum() {
        let mut catalog = Catalog::new();
        add_edition(&mut catalog, new_edition("Ubuntu", "Desktop")).unwrap();
        let entry = catalog.resolve("Ubuntu", "Desktop").unwrap();
        assert_eq!(entry.checksum, SUM.to_lowercase());
        assert_eq!(
            catalog.description("Ubuntu"),
            Some("Popular desktop distribution")
        );
    }

    #[test]
    fn new_distribution_needs_description() {
        let mut catalog = Catalog::new();
        let mut e = new_edition("Fedora", "Workstation");
        e.description = None;
        assert!(add_edition(&mut catalog, e).is_err());
        assert!(catalog.is_empty());
    }

    #[test]
    fn existing_distribution_keeps_order_and_description() {
        let mut catalog = Catalog::new();
        add_edition(&mut catalog, new_edition("Ubuntu", "Desktop")).unwrap();
        add_edition(&mut catalog, new_edition("Ubuntu", "Server")).unwrap();
        let mut again = new_edition("Ubuntu", "Desktop");
        again.description = None;
        again.filename = "ubuntu-24.04.iso".to_string();
        add_edition(&mut catalog, again).unwrap();

        assert_eq!(catalog.editions("Ubuntu"), vec!["Desktop", "Server"]);
        assert_eq!(
            catalog.resolve("Ubuntu", "Desktop").unwrap().filename,
            "ubuntu-24.04.iso"
        );
        assert_eq!(
            catalog.description("Ubuntu"),
            Some("Popular desktop distribution")
        );
    }

    #[test]
    fn rejects_bad_fields() {
        let mut catalog = Catalog::new();

        let mut e = new_edition("Ubuntu", "Desktop");
        e.url = "ftp://example.com/x.iso".to_string();
        assert!(add_edition(&mut catalog, e).is_err());

        let mut e = new_edition("Ubuntu", "Desktop");
        e.checksum = "abc123".to_string();
        assert!(add_edition(&mut catalog, e).is_err());

        let mut e = new_edition("Ubuntu", "Desktop");
        e.checksum = "g".repeat(64);
        assert!(add_edition(&mut catalog, e).is_err());

        let mut e = new_edition("Ubuntu", "Desktop");
        e.filename = "../escape.iso".to_string();
        assert!(add_edition(&mut catalog, e).is_err());

        let mut e = new_edition("Ubuntu", "Desktop");
        e.filename = "..".to_string();
        assert!(add_edition(&mut catalog, e).is_err());

        assert!(catalog.is_empty());
    }

    #[test]
    fn run_creates_and_extends_catalog_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("distro_data.json");

        run_catalog_add(&path, new_edition("Ubuntu", "Desktop")).unwrap();
        run_catalog_add(&path, new_edition("Debian", "Netinst")).unwrap();

        let load = Catalog::load(&path).unwrap();
        assert!(load.issues.is_empty());
        assert_eq!(load.catalog.distributions(), vec!["Ubuntu", "Debian"]);
    }

    #[test]
    fn run_refuses_to_rewrite_catalog_with_invalid_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("distro_data.json");
        let original = r#"{"Broken": {"description": "x", "editions": {"A": {"filename": "a.iso"}}}}"#;
        std::fs::write(&path, original).unwrap();

        assert!(run_catalog_add(&path, new_edition("Ubuntu", "Desktop")).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }
}
