use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3000";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;
const DEFAULT_USER_AGENT: &str = "LinkLens/0.1 (+event link previews)";

/// Per-user data directory (`<data dir>/linklens`), falling back to the
/// working directory on platforms without one.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
        .join("linklens")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub bind_address: String,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
    pub database_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            database_path: data_dir().join("linklens.sqlite"),
        }
    }
}

impl AppConfig {
    /// Reads `path` (or `config.json` in the data directory), then applies
    /// `LINKLENS_*` environment overrides. A missing file means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| data_dir().join("config.json"));
        let mut config = read_config(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("LINKLENS_BIND") {
            self.bind_address = bind;
        }
        if let Some(timeout) = lookup("LINKLENS_FETCH_TIMEOUT").and_then(|s| s.parse::<u64>().ok())
        {
            self.fetch_timeout_secs = timeout;
        }
        if let Some(agent) = lookup("LINKLENS_USER_AGENT") {
            self.user_agent = agent;
        }
        if let Some(database) = lookup("LINKLENS_DATABASE") {
            self.database_path = PathBuf::from(database);
        }
    }
}

fn read_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("unable to read config {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("invalid config {}", path.display()))
}
