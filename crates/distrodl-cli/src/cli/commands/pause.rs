//! `distrodl pause` – ask the running `distrodl download` to pause.

use anyhow::Result;

use crate::cli::control_socket::{self, ControlCommand};

pub async fn run_pause() -> Result<()> {
    control_socket::send_to_running(ControlCommand::Pause).await?;
    println!("Download paused");
    Ok(())
}
