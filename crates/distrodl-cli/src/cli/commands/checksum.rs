//! `distrodl checksum` – compute SHA-256 of a file.

use anyhow::Result;
use distrodl_core::checksum;
use std::path::Path;

use crate::cli::EXIT_CORRUPT;

/// Print the digest; with `expected`, also compare and return a non-zero code on mismatch.
pub fn run_checksum(path: &Path, expected: Option<&str>) -> Result<i32> {
    let digest = checksum::sha256_path(path)?;
    println!("{}  {}", digest, path.display());
    let Some(expected) = expected else {
        return Ok(0);
    };
    if checksum::digests_match(&digest, expected) {
        println!("OK");
        Ok(0)
    } else {
        println!("MISMATCH (expected {})", expected.trim().to_lowercase());
        Ok(EXIT_CORRUPT)
    }
}
