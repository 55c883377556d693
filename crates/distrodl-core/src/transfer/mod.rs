//! Resumable single-stream HTTP transfer engine.
//!
//! One GET per attempt (with `Range: bytes=<offset>-` when a `.part` file
//! exists), body streamed into the staging file in fixed-size chunks, pause
//! and cancel honored between chunks, rename into place on success.
//! Blocking: run it on a dedicated worker thread.

mod error;
mod headers;
mod pump;

pub use error::{ErrorKind, TransferError};

use std::cell::RefCell;
use std::path::Path;
use std::time::Duration;

use crate::config::TransferConfig;
use crate::control::TransferControl;
use crate::progress::TransferState;
use crate::storage;
use pump::{ChunkPump, Stop};

/// Receives a state snapshot after every chunk written, in order.
///
/// Implementations must not block for long: they run on the transfer worker.
pub trait ProgressSink {
    fn on_progress(&mut self, state: &TransferState);
}

impl<F> ProgressSink for F
where
    F: FnMut(&TransferState),
{
    fn on_progress(&mut self, state: &TransferState) {
        self(state)
    }
}

/// Terminal result of one `transfer` call.
#[derive(Debug)]
pub enum TransferOutcome {
    /// Body fully received and renamed to the destination.
    Success(TransferState),
    /// Attempt aborted; the staging file is left for a later resume.
    Failed(TransferError),
    /// Stopped by the caller; the staging file is left for the caller to remove.
    Cancelled,
}

impl TransferOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransferOutcome::Success(_))
    }
}

#[derive(Debug, Clone)]
pub struct TransferOptions {
    pub chunk_size: usize,
    pub response_timeout: Duration,
    pub pause_poll: Duration,
    pub user_agent: String,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self::from(&TransferConfig::default())
    }
}

impl From<&TransferConfig> for TransferOptions {
    fn from(cfg: &TransferConfig) -> Self {
        Self {
            chunk_size: cfg.chunk_size.max(1),
            response_timeout: cfg.response_timeout(),
            pause_poll: cfg.pause_poll(),
            user_agent: concat!("distrodl/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransferEngine {
    options: TransferOptions,
}

impl TransferEngine {
    pub fn new(options: TransferOptions) -> Self {
        Self { options }
    }

    /// Downloads `url` to `destination`, resuming from `<destination>.part` if present.
    ///
    /// Never retries on its own; calling again after `Failed` resumes from
    /// whatever reached the staging file.
    pub fn transfer<P>(
        &self,
        url: &str,
        destination: &Path,
        progress: &mut P,
        control: &TransferControl,
    ) -> TransferOutcome
    where
        P: ProgressSink + ?Sized,
    {
        let resume_from = storage::resume_offset(destination);
        if resume_from > 0 {
            tracing::info!(url, offset = resume_from, "resuming download");
        } else {
            tracing::info!(url, dest = %destination.display(), "starting download");
        }

        let pump = RefCell::new(ChunkPump::new(
            destination,
            resume_from,
            &self.options,
            control,
            progress,
        ));
        let performed = self.perform(url, resume_from, &pump);
        let mut pump = pump.into_inner();

        let result = match performed {
            Ok(code) => pump.finish(code),
            Err(e) => Err(pump.take_stop().unwrap_or(Stop::Network(e))),
        };

        let err = match result {
            Ok(state) => return TransferOutcome::Success(state),
            Err(Stop::Cancelled) => {
                tracing::info!(url, "download cancelled");
                return TransferOutcome::Cancelled;
            }
            Err(Stop::Status(code)) => TransferError::HttpStatus(code),
            Err(Stop::Filesystem(e)) => TransferError::filesystem(&e),
            Err(Stop::ResponseTimeout) => {
                TransferError::ResponseTimeout(self.options.response_timeout)
            }
            Err(Stop::Network(e)) => TransferError::Curl(e),
        };
        tracing::error!(url, kind = ?err.kind(), "download failed: {}", err);
        TransferOutcome::Failed(err)
    }

    /// Runs the GET and returns the final response code.
    fn perform<P>(
        &self,
        url: &str,
        resume_from: u64,
        pump: &RefCell<ChunkPump<'_, P>>,
    ) -> Result<u32, curl::Error>
    where
        P: ProgressSink + ?Sized,
    {
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.options.response_timeout)?;
        easy.useragent(&self.options.user_agent)?;
        easy.progress(true)?;
        if resume_from > 0 {
            // curl expects "start-" (open-ended), it adds the "bytes=" prefix itself.
            easy.range(&format!("{}-", resume_from))?;
        }

        {
            let mut transfer = easy.transfer();
            transfer.header_function(|line| {
                pump.borrow_mut().on_header(line);
                true
            })?;
            transfer.write_function(|data| {
                if pump.borrow_mut().on_data(data) {
                    Ok(data.len())
                } else {
                    Ok(0)
                }
            })?;
            transfer.progress_function(|_, _, _, _| pump.borrow_mut().on_tick())?;
            transfer.perform()?;
        }

        easy.response_code()
    }
}
