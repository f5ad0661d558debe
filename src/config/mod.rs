//! Daemon configuration.
//!
//! Priority (highest to lowest): CLI / env vars, then `{data_dir}/config.toml`,
//! then built-in defaults. The state and policy documents referenced here are
//! separate JSON files owned by the control-panel layer — this config only
//! decides where to find them.

use crate::display::DisplayConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::error;

const DEFAULT_OFFLINE_URL: &str = "http://127.0.0.1:8080/offline";

/// `{data_dir}/config.toml` — all fields are optional overrides.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// Path of the persisted kiosk state document (default: `{data_dir}/state.json`).
    state_file: Option<PathBuf>,
    /// Path of the policy document (default: `{data_dir}/policy.json`).
    policy_file: Option<PathBuf>,
    /// URL of the offline player served by the control panel.
    offline_url: Option<String>,
    /// Log level filter string, e.g. "debug", "info,emberd=trace" (default: "info").
    log: Option<String>,
    /// Log output format: "pretty" (default) | "json" (structured for log aggregators).
    log_format: Option<String>,
    /// Display supervision knobs (`[display]`).
    display: Option<DisplayConfig>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct WatcherConfig {
    pub data_dir: PathBuf,
    pub state_file: PathBuf,
    pub policy_file: PathBuf,
    /// Target the display falls back to whenever online playback is not
    /// possible. Served by the control-panel layer.
    pub offline_url: String,
    pub log: String,
    /// "pretty" | "json".
    pub log_format: String,
    pub display: DisplayConfig,
}

impl WatcherConfig {
    /// Build config from CLI/env args + optional TOML file.
    pub fn new(
        data_dir: Option<PathBuf>,
        state_file: Option<PathBuf>,
        policy_file: Option<PathBuf>,
        offline_url: Option<String>,
        log: Option<String>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);

        // Load TOML as the lowest-priority override layer.
        let toml = load_toml(&data_dir).unwrap_or_default();

        let state_file = state_file
            .or(toml.state_file)
            .unwrap_or_else(|| data_dir.join("state.json"));
        let policy_file = policy_file
            .or(toml.policy_file)
            .unwrap_or_else(|| data_dir.join("policy.json"));
        let offline_url = offline_url
            .or(toml.offline_url)
            .unwrap_or_else(|| DEFAULT_OFFLINE_URL.to_string());
        let log = log.or(toml.log).unwrap_or_else(|| "info".to_string());

        let log_format = std::env::var("EMBERD_LOG_FORMAT")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.log_format)
            .unwrap_or_else(|| "pretty".to_string());

        let mut display = toml.display.unwrap_or_default();
        if display.profile_dir.as_os_str().is_empty() {
            display.profile_dir = data_dir.join("browser-profile");
        }

        Self {
            data_dir,
            state_file,
            policy_file,
            offline_url,
            log,
            log_format,
            display,
        }
    }
}

fn default_data_dir() -> PathBuf {
    // Fixed install prefix on kiosk images; XDG fallback for development.
    let system = PathBuf::from("/opt/emberd");
    if system.is_dir() {
        return system;
    }
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        if !xdg.is_empty() {
            return PathBuf::from(xdg).join("emberd");
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share").join("emberd");
    }
    PathBuf::from(".emberd")
}
