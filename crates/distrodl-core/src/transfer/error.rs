//! Failure reasons for one transfer attempt.

use std::time::Duration;

/// Broad class of a transfer failure, used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Filesystem,
}

/// Why an attempt failed. The staging file is kept in every case so that a
/// later attempt can resume from it.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Curl reported an error (connection refused, DNS, reset, ...).
    #[error("network error: {0}")]
    Curl(#[from] curl::Error),
    /// The final response had a non-2xx status.
    #[error("server returned HTTP {0}")]
    HttpStatus(u32),
    /// No response headers arrived within the configured window.
    #[error("no response within {}s", .0.as_secs())]
    ResponseTimeout(Duration),
    /// Staging file could not be opened, written or renamed.
    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl TransferError {
    pub(crate) fn filesystem(err: &anyhow::Error) -> Self {
        TransferError::Filesystem(format!("{:#}", err))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TransferError::Curl(_)
            | TransferError::HttpStatus(_)
            | TransferError::ResponseTimeout(_) => ErrorKind::Network,
            TransferError::Filesystem(_) => ErrorKind::Filesystem,
        }
    }
}
