//! `distrodl resume` – continue a paused download.

use anyhow::Result;

use crate::cli::control_socket::{self, ControlCommand};

pub async fn run_resume() -> Result<()> {
    control_socket::send_to_running(ControlCommand::Resume).await?;
    println!("Download resumed");
    Ok(())
}
