//! SHA-256 verification of downloaded images.
//!
//! Runs after the transfer completes, never inline with the download path.
//! The digest depends only on file content; block size is an internal detail.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// Compute SHA-256 of a file and return the digest as lowercase hex.
/// Reads in chunks to keep memory use bounded; suitable for multi-GB ISOs.
pub fn sha256_path(path: &Path) -> Result<String> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    sha256_reader(f, BUF_SIZE).with_context(|| format!("read {}", path.display()))
}

fn sha256_reader<R: Read>(mut reader: R, block_size: usize) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; block_size.max(1)];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Case-insensitive comparison of two hex digests.
pub fn digests_match(actual: &str, expected: &str) -> bool {
    actual.trim().to_lowercase() == expected.trim().to_lowercase()
}

/// Returns true if the SHA-256 of `path` equals `expected_hex` (case-insensitive).
/// Fails only when the file cannot be opened or read.
pub fn verify(path: &Path, expected_hex: &str) -> Result<bool> {
    let actual = sha256_path(path)?;
    let ok = digests_match(&actual, expected_hex);
    tracing::info!(
        path = %path.display(),
        expected = %expected_hex.trim().to_lowercase(),
        calculated = %actual,
        ok,
        "checksum verification"
    );
    Ok(ok)
}
