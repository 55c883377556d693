//! Caller side of a download: one transfer at a time on a worker thread,
//! progress over an ordered channel, cleanup on cancel, verification on success.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use tokio::sync::mpsc;

use crate::catalog::CatalogEntry;
use crate::checksum;
use crate::control::TransferControl;
use crate::progress::TransferState;
use crate::storage;
use crate::transfer::{ErrorKind, TransferEngine, TransferOutcome};

/// Capacity of the event channel; progress snapshots beyond it are dropped, never reordered.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Final state of one download as reported to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadReport {
    /// Downloaded and the digest matched.
    Verified { path: PathBuf },
    /// Downloaded but the digest did not match. The file is kept for inspection.
    Corrupt {
        path: PathBuf,
        expected: String,
        actual: String,
    },
    /// Transfer or verification failed; a `.part` file may remain for resume.
    Failed { kind: ErrorKind, reason: String },
    /// Stopped by the user; the staging file has been removed.
    Cancelled,
}

impl DownloadReport {
    pub fn is_verified(&self) -> bool {
        matches!(self, DownloadReport::Verified { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    Started {
        destination: PathBuf,
        resume_from: u64,
    },
    Progress(TransferState),
    Verifying,
    Finished(DownloadReport),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("a download is already in progress")]
    Busy,
    #[error("cannot create download directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot start download worker: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Clears the busy flag when the worker ends, however it ends.
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Starts downloads and refuses to run two at once.
#[derive(Debug, Clone)]
pub struct Downloader {
    engine: Arc<TransferEngine>,
    active: Arc<AtomicBool>,
    event_capacity: usize,
}

impl Downloader {
    pub fn new(engine: TransferEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            active: Arc::new(AtomicBool::new(false)),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    pub fn is_busy(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Start downloading `entry` into `download_dir` on a dedicated worker thread.
    pub fn start(
        &self,
        entry: &CatalogEntry,
        download_dir: &Path,
    ) -> Result<DownloadHandle, SessionError> {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!(file = %entry.filename, "download rejected: another one is running");
            return Err(SessionError::Busy);
        }
        let guard = ActiveGuard(Arc::clone(&self.active));

        std::fs::create_dir_all(download_dir).map_err(|source| SessionError::CreateDir {
            path: download_dir.to_path_buf(),
            source,
        })?;

        let destination = download_dir.join(&entry.filename);
        let control = TransferControl::new();
        let (tx, rx) = mpsc::channel(self.event_capacity);

        let job = Job {
            engine: Arc::clone(&self.engine),
            entry: entry.clone(),
            destination,
            control: control.clone(),
            tx,
        };
        let worker = std::thread::Builder::new()
            .name("distrodl-transfer".to_string())
            .spawn(move || job.run(guard))
            .map_err(SessionError::Spawn)?;

        Ok(DownloadHandle {
            control,
            events: rx,
            worker,
        })
    }
}

/// Handle to a running download.
pub struct DownloadHandle {
    control: TransferControl,
    events: mpsc::Receiver<DownloadEvent>,
    worker: JoinHandle<DownloadReport>,
}

impl DownloadHandle {
    /// Pause/resume/cancel for this download. Cloneable and thread-safe.
    pub fn control(&self) -> &TransferControl {
        &self.control
    }

    /// Next event, or None once the worker has finished and the channel is drained.
    pub async fn next_event(&mut self) -> Option<DownloadEvent> {
        self.events.recv().await
    }

    /// Wait for the worker and return its report.
    ///
    /// Undelivered events are discarded so the worker never waits on a full channel.
    pub fn join(self) -> DownloadReport {
        let DownloadHandle { events, worker, .. } = self;
        drop(events);
        worker.join().unwrap_or_else(|_| DownloadReport::Failed {
            kind: ErrorKind::Filesystem,
            reason: "download worker panicked".to_string(),
        })
    }
}

/// Everything the worker thread owns.
struct Job {
    engine: Arc<TransferEngine>,
    entry: CatalogEntry,
    destination: PathBuf,
    control: TransferControl,
    tx: mpsc::Sender<DownloadEvent>,
}

impl Job {
    fn run(self, guard: ActiveGuard) -> DownloadReport {
        let report = self.execute();
        drop(guard);
        tracing::info!(file = %self.entry.filename, report = ?report, "download finished");
        let _ = self.tx.blocking_send(DownloadEvent::Finished(report.clone()));
        report
    }

    fn execute(&self) -> DownloadReport {
        let resume_from = storage::resume_offset(&self.destination);
        let _ = self.tx.blocking_send(DownloadEvent::Started {
            destination: self.destination.clone(),
            resume_from,
        });

        let tx = &self.tx;
        let mut sink = |state: &TransferState| {
            let _ = tx.try_send(DownloadEvent::Progress(*state));
        };
        let outcome =
            self.engine
                .transfer(&self.entry.url, &self.destination, &mut sink, &self.control);

        match outcome {
            TransferOutcome::Success(_) => self.verify(),
            TransferOutcome::Failed(err) => DownloadReport::Failed {
                kind: err.kind(),
                reason: err.to_string(),
            },
            TransferOutcome::Cancelled => {
                if let Err(e) = storage::discard_partial(&self.destination) {
                    tracing::warn!("failed to clean up partial download: {}", e);
                }
                DownloadReport::Cancelled
            }
        }
    }

    fn verify(&self) -> DownloadReport {
        let _ = self.tx.blocking_send(DownloadEvent::Verifying);
        let path = self.destination.clone();
        match checksum::sha256_path(&path) {
            Ok(actual) if checksum::digests_match(&actual, &self.entry.checksum) => {
                tracing::info!(path = %path.display(), "verification successful");
                DownloadReport::Verified { path }
            }
            Ok(actual) => {
                tracing::error!(
                    path = %path.display(),
                    expected = %self.entry.checksum,
                    calculated = %actual,
                    "checksum verification failed"
                );
                DownloadReport::Corrupt {
                    path,
                    expected: self.entry.checksum.to_lowercase(),
                    actual,
                }
            }
            Err(e) => DownloadReport::Failed {
                kind: ErrorKind::Filesystem,
                reason: format!("checksum: {:#}", e),
            },
        }
    }
}
