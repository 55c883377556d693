//! `distrodl download` – fetch one edition, show progress, verify the checksum.
//!
//! Pause/resume/cancel arrive over the control socket; Ctrl-C cancels.

use anyhow::{bail, Context, Result};
use distrodl_core::catalog::Catalog;
use distrodl_core::config::DistrodlConfig;
use distrodl_core::control;
use distrodl_core::progress::{format_size, TransferState};
use distrodl_core::session::{DownloadEvent, DownloadReport, Downloader};
use distrodl_core::transfer::{TransferEngine, TransferOptions};
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::cli::{control_socket, EXIT_CANCELLED, EXIT_CORRUPT};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

pub async fn run_download(
    cfg: &DistrodlConfig,
    catalog: &Catalog,
    distribution: &str,
    edition: &str,
    dir: Option<&Path>,
) -> Result<i32> {
    let entry = catalog.resolve(distribution, edition).with_context(|| {
        format!(
            "no edition {:?} of {:?} in catalog (available: {})",
            edition,
            distribution,
            catalog.editions(distribution).join(", ")
        )
    })?;
    let download_dir = match dir.map(Path::to_path_buf).or_else(|| cfg.download_dir.clone()) {
        Some(d) => d,
        None => std::env::current_dir()?,
    };

    // Claim the control socket first: only one download may run at a time.
    let socket = match control::default_control_socket_path() {
        Ok(path) => {
            if control_socket::download_running(&path) {
                bail!("a download is already running; use `distrodl pause|resume|cancel` to control it");
            }
            match control_socket::bind_control_socket(&path) {
                Ok(listener) => Some((path, listener)),
                Err(e) => {
                    tracing::warn!("control socket unavailable: {:#}", e);
                    None
                }
            }
        }
        Err(e) => {
            tracing::warn!("control socket path: {}", e);
            None
        }
    };

    let downloader = Downloader::new(TransferEngine::new(TransferOptions::from(&cfg.transfer)));
    let mut handle = match downloader.start(entry, &download_dir) {
        Ok(h) => h,
        Err(e) => {
            if let Some((path, _)) = socket {
                let _ = std::fs::remove_file(path);
            }
            return Err(e.into());
        }
    };
    let transfer_control = handle.control().clone();
    let socket = socket.map(|(path, listener)| {
        tracing::debug!(path = %path.display(), "control socket listening");
        let task = control_socket::serve_control(listener, transfer_control.clone());
        (path, task)
    });

    let on_interrupt = transfer_control.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nCancelling...");
            on_interrupt.cancel();
        }
    });

    let mut line = ProgressLine::default();
    while let Some(event) = handle.next_event().await {
        match event {
            DownloadEvent::Started {
                destination,
                resume_from,
            } => {
                if resume_from > 0 {
                    println!(
                        "Resuming {} at {}",
                        destination.display(),
                        format_size(resume_from)
                    );
                } else {
                    println!("Downloading {} -> {}", entry.url, destination.display());
                }
            }
            DownloadEvent::Progress(state) => line.update(&state),
            DownloadEvent::Verifying => {
                line.finish();
                println!("Verifying checksum...");
            }
            DownloadEvent::Finished(_) => line.finish(),
        }
    }

    interrupt.abort();
    if let Some((path, task)) = socket {
        task.abort();
        let _ = std::fs::remove_file(path);
    }

    let report = tokio::task::spawn_blocking(move || handle.join()).await?;
    Ok(print_report(&report))
}

/// Print the outcome and map it to an exit code.
fn print_report(report: &DownloadReport) -> i32 {
    match report {
        DownloadReport::Verified { path } => {
            println!("Verified: {}", path.display());
            0
        }
        DownloadReport::Corrupt {
            path,
            expected,
            actual,
        } => {
            eprintln!("Checksum mismatch for {}", path.display());
            eprintln!("  expected: {}", expected);
            eprintln!("  actual:   {}", actual);
            EXIT_CORRUPT
        }
        DownloadReport::Failed { reason, .. } => {
            eprintln!("Download failed: {}", reason);
            eprintln!("Run the same command again to resume.");
            1
        }
        DownloadReport::Cancelled => {
            println!("Download cancelled.");
            EXIT_CANCELLED
        }
    }
}

/// Single progress line, redrawn at most every `PROGRESS_INTERVAL`.
#[derive(Debug, Default)]
struct ProgressLine {
    last_print: Option<Instant>,
    drawn: bool,
}

impl ProgressLine {
    fn update(&mut self, state: &TransferState) {
        let now = Instant::now();
        let complete = state.total_bytes > 0 && state.bytes_transferred >= state.total_bytes;
        let due = self
            .last_print
            .map_or(true, |t| now.duration_since(t) >= PROGRESS_INTERVAL);
        if !due && !complete {
            return;
        }
        print!("\r{}", render_progress(state, now));
        let _ = std::io::stdout().flush();
        self.last_print = Some(now);
        self.drawn = true;
    }

    fn finish(&mut self) {
        if self.drawn {
            println!();
            self.drawn = false;
        }
    }
}

fn render_progress(state: &TransferState, now: Instant) -> String {
    let done = format_size(state.bytes_transferred);
    let rate = format_size(state.bytes_per_sec_at(now) as u64);
    match state.percent() {
        Some(pct) => {
            let eta = state
                .eta_secs_at(now)
                .map(|s| format!("{:.0}s", s))
                .unwrap_or_else(|| "?".to_string());
            format!(
                "  {} / {} ({:.1}%)  {}/s  ETA {}  ",
                done,
                format_size(state.total_bytes),
                pct,
                rate,
                eta
            )
        }
        None => format!("  {}  {}/s  ", done, rate),
    }
}
