//! Per-attempt state driven by the libcurl callbacks.
//!
//! Body bytes are regrouped into fixed-size chunks; pause and cancel are
//! checked before each chunk is written to the staging file.

use std::path::Path;
use std::time::Instant;

use super::headers::ResponseHead;
use super::{ProgressSink, TransferOptions};
use crate::control::TransferControl;
use crate::progress::TransferState;
use crate::storage::StagingFile;

/// Why the pump asked curl to abort.
#[derive(Debug)]
pub(crate) enum Stop {
    Cancelled,
    Status(u32),
    Filesystem(anyhow::Error),
    ResponseTimeout,
    Network(curl::Error),
}

pub(crate) struct ChunkPump<'a, P: ProgressSink + ?Sized> {
    destination: &'a Path,
    resume_from: u64,
    options: &'a TransferOptions,
    control: &'a TransferControl,
    progress: &'a mut P,
    started_at: Instant,
    head: ResponseHead,
    staging: Option<StagingFile>,
    pending: Vec<u8>,
    state: TransferState,
    stop: Option<Stop>,
}

impl<'a, P: ProgressSink + ?Sized> ChunkPump<'a, P> {
    pub fn new(
        destination: &'a Path,
        resume_from: u64,
        options: &'a TransferOptions,
        control: &'a TransferControl,
        progress: &'a mut P,
    ) -> Self {
        let started_at = Instant::now();
        Self {
            destination,
            resume_from,
            options,
            control,
            progress,
            started_at,
            head: ResponseHead::default(),
            staging: None,
            pending: Vec::with_capacity(options.chunk_size),
            state: TransferState::new(resume_from, 0, started_at),
            stop: None,
        }
    }

    pub fn on_header(&mut self, line: &[u8]) {
        self.head.feed_line(line);
    }

    /// Periodic callback from curl. Returns false to abort the transfer.
    pub fn on_tick(&mut self) -> bool {
        if self.stop.is_some() {
            return false;
        }
        if self.control.is_cancelled() {
            self.stop = Some(Stop::Cancelled);
            return false;
        }
        if !self.head.complete && self.started_at.elapsed() > self.options.response_timeout {
            self.stop = Some(Stop::ResponseTimeout);
            return false;
        }
        true
    }

    /// Body bytes from curl. Returns false to abort the transfer.
    pub fn on_data(&mut self, mut data: &[u8]) -> bool {
        if self.stop.is_some() {
            return false;
        }
        if self.staging.is_none() && !self.open_staging(self.head.status) {
            return false;
        }
        let chunk_size = self.options.chunk_size;

        if !self.pending.is_empty() {
            let take = (chunk_size - self.pending.len()).min(data.len());
            self.pending.extend_from_slice(&data[..take]);
            data = &data[take..];
            if self.pending.len() < chunk_size {
                return true;
            }
            let mut chunk = std::mem::take(&mut self.pending);
            let ok = self.emit(&chunk);
            chunk.clear();
            self.pending = chunk;
            if !ok {
                return false;
            }
        }

        while data.len() >= chunk_size {
            if !self.emit(&data[..chunk_size]) {
                return false;
            }
            data = &data[chunk_size..];
        }
        self.pending.extend_from_slice(data);
        true
    }

    /// Called once curl finished without error. Writes the tail chunk and
    /// renames the staging file into place.
    pub fn finish(mut self, response_code: u32) -> Result<TransferState, Stop> {
        if let Some(stop) = self.stop.take() {
            return Err(stop);
        }
        if !(200..300).contains(&response_code) {
            return Err(Stop::Status(response_code));
        }
        if self.staging.is_none() && !self.open_staging(Some(response_code)) {
            return Err(self.stop.take().unwrap_or(Stop::Status(response_code)));
        }
        if !self.pending.is_empty() {
            let tail = std::mem::take(&mut self.pending);
            if !self.emit(&tail) {
                return Err(self.stop.take().unwrap_or(Stop::Cancelled));
            }
        }
        if self.control.is_cancelled() {
            return Err(Stop::Cancelled);
        }
        let staging = match self.staging.take() {
            Some(s) => s,
            None => return Err(Stop::Status(response_code)),
        };
        let final_path = staging.finalize().map_err(Stop::Filesystem)?;
        tracing::info!(
            path = %final_path.display(),
            bytes = self.state.bytes_transferred,
            "transfer complete"
        );
        Ok(self.state)
    }

    pub fn take_stop(&mut self) -> Option<Stop> {
        self.stop.take()
    }

    /// Opens the staging file once the final status is known.
    fn open_staging(&mut self, status: Option<u32>) -> bool {
        let code = match status {
            Some(code) if (200..300).contains(&code) => code,
            Some(code) => {
                self.stop = Some(Stop::Status(code));
                return false;
            }
            None => {
                self.stop = Some(Stop::Status(0));
                return false;
            }
        };

        let resuming = self.resume_from > 0 && code == 206;
        if self.resume_from > 0 && !resuming {
            tracing::warn!(
                status = code,
                offset = self.resume_from,
                "server ignored range request; restarting from zero"
            );
            self.resume_from = 0;
        }

        let opened = if resuming {
            StagingFile::append(self.destination)
        } else {
            StagingFile::create(self.destination)
        };
        let staging = match opened {
            Ok(s) => s,
            Err(e) => {
                self.stop = Some(Stop::Filesystem(e));
                return false;
            }
        };

        let total = self
            .head
            .content_length
            .map(|len| len + self.resume_from)
            .unwrap_or(0);
        self.state = TransferState::new(staging.len(), total, self.started_at);
        tracing::debug!(
            status = code,
            offset = staging.len(),
            total,
            "response accepted, writing {}",
            staging.temp_path().display()
        );
        self.staging = Some(staging);
        true
    }

    /// Write one chunk after honoring cancel and pause. Returns false when the transfer must stop.
    fn emit(&mut self, chunk: &[u8]) -> bool {
        if self.control.is_cancelled() {
            self.stop = Some(Stop::Cancelled);
            return false;
        }
        if self.control.is_paused() {
            tracing::info!(bytes = self.state.bytes_transferred, "transfer paused");
            while self.control.is_paused() && !self.control.is_cancelled() {
                std::thread::sleep(self.options.pause_poll);
            }
            if self.control.is_cancelled() {
                self.stop = Some(Stop::Cancelled);
                return false;
            }
            tracing::info!("transfer resumed");
        }

        let staging = match self.staging.as_mut() {
            Some(s) => s,
            None => return false,
        };
        if let Err(e) = staging.write_chunk(chunk) {
            self.stop = Some(Stop::Filesystem(e));
            return false;
        }
        self.state.bytes_transferred += chunk.len() as u64;
        self.progress.on_progress(&self.state);
        true
    }
}
