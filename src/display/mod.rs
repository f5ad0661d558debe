//! Display-side components: the supervised kiosk browser process, the X
//! display environment it runs under, and the best-effort input automation
//! that follows a video-page launch.

pub mod automate;
pub mod env;
pub mod supervisor;

pub use env::DisplayEnv;
pub use supervisor::DisplaySupervisor;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Browser binaries to probe on PATH, in preference order.
pub const CANDIDATE_BROWSERS: &[&str] = &[
    "chromium-browser",
    "chromium",
    "chrome",
    "google-chrome",
];

/// Display supervision knobs (`[display]` in config.toml).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Browser binary to launch. None = probe `CANDIDATE_BROWSERS` on PATH.
    pub browser: Option<String>,
    /// Fixed browser profile directory. Empty = `{data_dir}/browser-profile`,
    /// resolved at config build time.
    pub profile_dir: PathBuf,
    /// How long to wait after spawn before re-checking liveness (ms).
    pub settle_delay_ms: u64,
    /// Grace period between SIGTERM and SIGKILL on stop (ms).
    pub stop_grace_ms: u64,
    /// Screen geometry for the automation click/park coordinates.
    pub screen_width: u32,
    pub screen_height: u32,
    /// Run the synthetic-input sequence after video-page launches.
    pub automation: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            browser: None,
            profile_dir: PathBuf::new(),
            settle_delay_ms: 2_000,
            stop_grace_ms: 5_000,
            screen_width: 1920,
            screen_height: 1080,
            automation: true,
        }
    }
}

/// Why a kiosk browser launch failed.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("no kiosk browser found on PATH (candidates: chromium-browser, chromium, chrome, google-chrome)")]
    NoBrowser,
    #[error("failed to spawn `{binary}`: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },
    #[error("browser exited during startup ({status})")]
    DiedOnStartup { status: std::process::ExitStatus },
}

/// Check whether `binary` resolves to an executable file on PATH.
pub(crate) fn find_on_path(binary: &str) -> bool {
    if let Ok(path_var) = std::env::var("PATH") {
        for dir in path_var.split(':') {
            if Path::new(dir).join(binary).is_file() {
                return true;
            }
        }
    }
    false
}

/// Probe for the first available kiosk-capable browser binary.
pub fn detect_browser() -> Option<String> {
    CANDIDATE_BROWSERS
        .iter()
        .find(|candidate| find_on_path(candidate))
        .map(|candidate| (*candidate).to_string())
}
