//! Control socket: server (during `distrodl download`) and client (for `distrodl pause|resume|cancel`).
//! Protocol: one line per command: "pause", "resume" or "cancel".

use anyhow::{bail, Context, Result};
use distrodl_core::control::{self, TransferControl};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Pause,
    Resume,
    Cancel,
}

impl ControlCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            ControlCommand::Pause => "pause",
            ControlCommand::Resume => "resume",
            ControlCommand::Cancel => "cancel",
        }
    }

    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "pause" => Some(ControlCommand::Pause),
            "resume" => Some(ControlCommand::Resume),
            "cancel" => Some(ControlCommand::Cancel),
            _ => None,
        }
    }

    pub fn apply(self, control: &TransferControl) {
        match self {
            ControlCommand::Pause => control.pause(),
            ControlCommand::Resume => control.resume(),
            ControlCommand::Cancel => control.cancel(),
        }
    }
}

/// True if a `distrodl download` is accepting connections at `path`.
pub fn download_running(path: &Path) -> bool {
    std::os::unix::net::UnixStream::connect(path).is_ok()
}

/// Binds the control socket at `path`. Fails if another download owns it;
/// a socket file left behind by a dead process is replaced.
pub fn bind_control_socket(path: &Path) -> Result<UnixListener> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    match std::os::unix::net::UnixStream::connect(path) {
        Ok(_) => bail!("a download is already running ({})", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
            tracing::debug!(path = %path.display(), "replacing stale control socket");
            std::fs::remove_file(path)
                .with_context(|| format!("removing stale control socket {}", path.display()))?;
        }
        Err(e) => {
            return Err(e).with_context(|| format!("probing control socket {}", path.display()))
        }
    }
    UnixListener::bind(path).with_context(|| format!("binding control socket {}", path.display()))
}

/// Spawns a task applying each command received on `listener` to `control`.
/// Malformed lines are ignored.
pub fn serve_control(listener: UnixListener, control: TransferControl) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let control = control.clone();
                    tokio::spawn(async move {
                        let mut reader = BufReader::new(stream).lines();
                        while let Ok(Some(line)) = reader.next_line().await {
                            match ControlCommand::parse(&line) {
                                Some(cmd) => {
                                    tracing::info!(command = cmd.as_str(), "control command received");
                                    cmd.apply(&control);
                                }
                                None => tracing::debug!("ignoring control line {:?}", line),
                            }
                        }
                    });
                }
                Err(e) => tracing::debug!("control socket accept: {}", e),
            }
        }
    })
}

/// Sends `cmd` followed by a newline. Returns false if nothing listens at `socket_path`.
pub async fn send_command(socket_path: &Path, cmd: ControlCommand) -> Result<bool> {
    if !socket_path.exists() {
        return Ok(false);
    }
    let mut stream = match UnixStream::connect(socket_path).await {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    stream.write_all(format!("{}\n", cmd.as_str()).as_bytes()).await?;
    stream.shutdown().await?;
    Ok(true)
}

/// Sends `cmd` to the download running in another process, via the default socket.
pub async fn send_to_running(cmd: ControlCommand) -> Result<()> {
    let path = control::default_control_socket_path()?;
    if !send_command(&path, cmd).await? {
        bail!("no download is running");
    }
    Ok(())
}
