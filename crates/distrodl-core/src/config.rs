use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Transfer engine tuning (optional `[transfer]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Bytes written per chunk; pause/cancel are checked between chunks.
    pub chunk_size: usize,
    /// Seconds allowed for connecting and receiving the response headers.
    pub response_timeout_secs: u64,
    /// How often a paused transfer re-checks its control flags, in milliseconds.
    pub pause_poll_ms: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: 8192,
            response_timeout_secs: 30,
            pause_poll_ms: 100,
        }
    }
}

impl TransferConfig {
    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.response_timeout_secs)
    }

    pub fn pause_poll(&self) -> Duration {
        Duration::from_millis(self.pause_poll_ms)
    }
}

/// Global configuration loaded from `~/.config/distrodl/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DistrodlConfig {
    /// Where images are saved (None = current directory).
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Catalog JSON file (None = `distro_data.json` in the current directory).
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
    #[serde(default)]
    pub transfer: TransferConfig,
}

/// Catalog file name looked up in the working directory when none is configured.
pub const DEFAULT_CATALOG_FILE: &str = "distro_data.json";

impl DistrodlConfig {
    pub fn catalog_path(&self) -> PathBuf {
        self.catalog_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_FILE))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("distrodl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<DistrodlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = DistrodlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: DistrodlConfig = toml::from_str(&data)?;
    Ok(cfg)
}
