use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Global configuration loaded from `~/.config/urlbatch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of concurrent download workers.
    pub workers: usize,
    /// Consecutive failures (across all workers) that trigger a cooldown. 0 = every failure.
    pub error_threshold: u32,
    /// Seconds the tripping worker sleeps once the threshold is reached.
    pub cooldown_secs: u64,
    /// Total time limit for one GET, in seconds.
    pub timeout_secs: u64,
    /// Connect timeout for one GET, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Emit a milestone progress event every N processed items (0 disables).
    #[serde(default = "default_milestone_every")]
    pub milestone_every: u64,
    /// Headers sent with every request (e.g. `User-Agent`, `Cookie`).
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_milestone_every() -> u64 {
    1000
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            error_threshold: 1000,
            cooldown_secs: 0,
            timeout_secs: 600,
            connect_timeout_secs: default_connect_timeout_secs(),
            milestone_every: default_milestone_every(),
            headers: BTreeMap::new(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("urlbatch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<BatchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = BatchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: BatchConfig = toml::from_str(&data)?;
    Ok(cfg)
}
