//! Catalog of downloadable images: distribution → edition → (filename, url, checksum).
//!
//! Loaded from a JSON file, validated entry by entry. Order of distributions
//! and editions follows the file. The transfer engine only reads it; the
//! `catalog-add` command is the one writer.

mod validate;

pub use validate::{
    is_hex, is_http_url, is_sha256_hex, is_valid_filename, Severity, ValidationIssue, SHA256_HEX_LEN,
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Download metadata for one edition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub filename: String,
    pub url: String,
    pub checksum: String,
}

/// A distribution and its editions, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    pub description: String,
    pub editions: Vec<(String, CatalogEntry)>,
}

impl Distribution {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            editions: Vec::new(),
        }
    }

    /// Insert or replace an edition; a replaced edition keeps its position.
    pub fn insert_edition(&mut self, name: String, entry: CatalogEntry) {
        match self.editions.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = entry,
            None => self.editions.push((name, entry)),
        }
    }

    pub fn edition(&self, name: &str) -> Option<&CatalogEntry> {
        self.editions
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, e)| e)
    }

    fn to_value(&self) -> Value {
        let mut editions = Map::new();
        for (name, entry) in &self.editions {
            editions.insert(
                name.clone(),
                serde_json::to_value(entry).unwrap_or(Value::Null),
            );
        }
        let mut obj = Map::new();
        obj.insert("description".to_string(), Value::String(self.description.clone()));
        obj.insert("editions".to_string(), Value::Object(editions));
        Value::Object(obj)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogStats {
    pub distributions: usize,
    pub editions: usize,
}

/// Failures that make the whole catalog file unusable.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("cannot read catalog {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog root must be an object")]
    NotAnObject,
    #[error("cannot write catalog {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A parsed catalog plus everything validation had to say about it.
#[derive(Debug, Clone)]
pub struct CatalogLoad {
    pub catalog: Catalog,
    pub issues: Vec<ValidationIssue>,
}

impl CatalogLoad {
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| !i.is_error())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    distributions: Vec<(String, Distribution)>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and validate a catalog file. Unreadable or unparsable files are
    /// fatal; invalid entries are left out and reported in `issues`.
    pub fn load(path: &Path) -> Result<CatalogLoad, CatalogError> {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CatalogError::NotFound(path.to_path_buf()))
            }
            Err(source) => {
                return Err(CatalogError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let load = Self::parse(&text)?;
        tracing::info!(
            path = %path.display(),
            distributions = load.catalog.len(),
            errors = load.errors().count(),
            warnings = load.warnings().count(),
            "catalog loaded"
        );
        for issue in &load.issues {
            match issue.severity {
                Severity::Error => tracing::error!("{}", issue),
                Severity::Warning => tracing::warn!("{}", issue),
            }
        }
        Ok(load)
    }

    /// Parse and validate catalog JSON text.
    pub fn parse(text: &str) -> Result<CatalogLoad, CatalogError> {
        let root: Value = serde_json::from_str(text)?;
        let root = match root {
            Value::Object(m) => m,
            _ => return Err(CatalogError::NotAnObject),
        };

        let mut catalog = Catalog::new();
        let mut issues = Vec::new();
        for (name, value) in &root {
            if let Some(distro) = validate::validate_distribution(name, value, &mut issues) {
                catalog.distributions.push((name.clone(), distro));
            }
        }
        Ok(CatalogLoad { catalog, issues })
    }

    pub fn len(&self) -> usize {
        self.distributions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distributions.is_empty()
    }

    /// Distribution names in catalog order.
    pub fn distributions(&self) -> Vec<&str> {
        self.distributions.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn distribution(&self, name: &str) -> Option<&Distribution> {
        self.distributions
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d)
    }

    pub fn description(&self, name: &str) -> Option<&str> {
        self.distribution(name).map(|d| d.description.as_str())
    }

    /// Edition names of `distribution` in catalog order; empty if unknown.
    pub fn editions(&self, distribution: &str) -> Vec<&str> {
        self.distribution(distribution)
            .map(|d| d.editions.iter().map(|(n, _)| n.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn resolve(&self, distribution: &str, edition: &str) -> Option<&CatalogEntry> {
        self.distribution(distribution)?.edition(edition)
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            distributions: self.distributions.len(),
            editions: self.distributions.iter().map(|(_, d)| d.editions.len()).sum(),
        }
    }

    /// Add a distribution or replace an existing one in place.
    pub fn upsert_distribution(&mut self, name: impl Into<String>, distro: Distribution) {
        let name = name.into();
        match self.distributions.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = distro,
            None => self.distributions.push((name, distro)),
        }
    }

    pub fn to_json_value(&self) -> Value {
        let mut root = Map::new();
        for (name, distro) in &self.distributions {
            root.insert(name.clone(), distro.to_value());
        }
        Value::Object(root)
    }

    /// Write the catalog as pretty JSON, preserving order.
    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        let mut json = serde_json::to_string_pretty(&self.to_json_value())?;
        json.push('\n');
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| CatalogError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, json).map_err(|source| CatalogError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "catalog saved");
        Ok(())
    }
}
