//! `distrodl cancel` – stop the running download; its partial file is removed.

use anyhow::Result;

use crate::cli::control_socket::{self, ControlCommand};

pub async fn run_cancel() -> Result<()> {
    control_socket::send_to_running(ControlCommand::Cancel).await?;
    println!("Cancel requested");
    Ok(())
}
