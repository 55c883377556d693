//! Pause/cancel control shared between the caller and the transfer worker.
//!
//! The worker checks the flags at every chunk boundary; the caller (or the
//! control socket listener) flips them from another thread.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Flags {
    paused: AtomicBool,
    cancelled: AtomicBool,
}

/// Cloneable handle to one transfer's pause/cancel flags.
///
/// Once cancelled, a control stays cancelled; `pause`/`resume` have no effect after that.
#[derive(Debug, Clone, Default)]
pub struct TransferControl {
    flags: Arc<Flags>,
}

impl TransferControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        if !self.is_cancelled() {
            self.flags.paused.store(true, Ordering::SeqCst);
        }
    }

    pub fn resume(&self) {
        self.flags.paused.store(false, Ordering::SeqCst);
    }

    /// Flip pause state; returns the new paused value.
    pub fn toggle_pause(&self) -> bool {
        if self.is_paused() {
            self.resume();
            false
        } else {
            self.pause();
            self.is_paused()
        }
    }

    pub fn cancel(&self) {
        self.flags.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.flags.paused.load(Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.flags.cancelled.load(Ordering::SeqCst)
    }
}

/// Default path for the control socket used by `distrodl pause|resume|cancel`.
pub fn default_control_socket_path() -> std::io::Result<PathBuf> {
    let dir = xdg::BaseDirectories::with_prefix("distrodl")?.get_state_home();
    Ok(dir.join("control.sock"))
}
