//! Light schema checks for the loosely-typed catalog JSON.
//!
//! Errors exclude the offending distribution or edition; warnings keep it.

use serde_json::{Map, Value};
use std::fmt;

use super::{CatalogEntry, Distribution};

/// Expected length of a hex SHA-256 digest.
pub const SHA256_HEX_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// One finding from catalog validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub distribution: String,
    pub edition: Option<String>,
    pub message: String,
}

impl ValidationIssue {
    fn new(sev: Severity, distro: &str, edition: Option<&str>, message: String) -> Self {
        Self {
            severity: sev,
            distribution: distro.to_string(),
            edition: edition.map(str::to_string),
            message,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match &self.edition {
            Some(e) => write!(f, "{}: {} / {}: {}", level, self.distribution, e, self.message),
            None => write!(f, "{}: {}: {}", level, self.distribution, self.message),
        }
    }
}

/// True if `url` parses and uses the http or https scheme.
pub fn is_http_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(u) => matches!(u.scheme(), "http" | "https") && u.has_host(),
        Err(_) => false,
    }
}

pub fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Strict check used when authoring entries: exactly 64 hex characters.
pub fn is_sha256_hex(s: &str) -> bool {
    s.len() == SHA256_HEX_LEN && is_hex(s)
}

/// A bare file name: non-empty, no path separator, not `.` or `..`.
pub fn is_valid_filename(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && !name.contains('/') && name != "." && name != ".."
}

/// Validate one distribution object. Returns it with only the valid editions,
/// or None when the distribution itself is unusable.
pub(crate) fn validate_distribution(
    name: &str,
    value: &Value,
    issues: &mut Vec<ValidationIssue>,
) -> Option<Distribution> {
    let error = |issues: &mut Vec<ValidationIssue>, msg: String| {
        issues.push(ValidationIssue::new(Severity::Error, name, None, msg));
    };

    let obj = match value.as_object() {
        Some(o) => o,
        None => {
            error(issues, "distribution must be an object".to_string());
            return None;
        }
    };
    let description = match obj.get("description") {
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            error(issues, "'description' must be a string".to_string());
            return None;
        }
        None => {
            error(issues, "missing required field 'description'".to_string());
            return None;
        }
    };
    let editions_obj = match obj.get("editions") {
        Some(Value::Object(m)) => m,
        Some(_) => {
            error(issues, "'editions' must be an object".to_string());
            return None;
        }
        None => {
            error(issues, "missing required field 'editions'".to_string());
            return None;
        }
    };
    if editions_obj.is_empty() {
        error(issues, "no editions defined".to_string());
        return None;
    }

    let mut distro = Distribution::new(description);
    for (edition_name, edition_value) in editions_obj {
        if let Some(entry) = validate_edition(name, edition_name, edition_value, issues) {
            distro.insert_edition(edition_name.clone(), entry);
        }
    }
    if distro.editions.is_empty() {
        error(issues, "no valid editions".to_string());
        return None;
    }
    Some(distro)
}

fn validate_edition(
    distro: &str,
    edition: &str,
    value: &Value,
    issues: &mut Vec<ValidationIssue>,
) -> Option<CatalogEntry> {
    let mut push = |sev: Severity, msg: String| {
        issues.push(ValidationIssue::new(sev, distro, Some(edition), msg));
    };

    let obj: &Map<String, Value> = match value.as_object() {
        Some(o) => o,
        None => {
            push(Severity::Error, "edition must be an object".to_string());
            return None;
        }
    };

    let mut fields = [None, None, None];
    for (slot, field) in fields.iter_mut().zip(["filename", "url", "checksum"]) {
        match obj.get(field) {
            Some(Value::String(s)) => *slot = Some(s.clone()),
            Some(_) => {
                push(Severity::Error, format!("'{}' must be a string", field));
                return None;
            }
            None => {
                push(Severity::Error, format!("missing required field '{}'", field));
                return None;
            }
        }
    }
    let [filename, url, checksum] = fields.map(Option::unwrap_or_default);

    if !is_http_url(&url) {
        push(Severity::Error, format!("invalid URL format: {}", url));
        return None;
    }
    if !is_valid_filename(&filename) {
        push(Severity::Error, format!("invalid filename: {:?}", filename));
        return None;
    }
    if !is_hex(&checksum) {
        push(Severity::Error, "checksum is not a hex string".to_string());
        return None;
    }
    if checksum.len() != SHA256_HEX_LEN {
        push(
            Severity::Warning,
            format!(
                "checksum has {} characters, may not be SHA-256 ({} expected)",
                checksum.len(),
                SHA256_HEX_LEN
            ),
        );
    }

    Some(CatalogEntry {
        filename,
        url,
        checksum,
    })
}
