//! The policy document — operator-owned tuning knobs for the watcher.
//!
//! Loaded once at startup. An unreadable or malformed policy never prevents
//! the daemon from running: it falls back to built-in defaults so the display
//! still reaches a deterministic offline target.

use serde::Deserialize;
use std::path::Path;
use tracing::{error, info};

const DEFAULT_CHECK_INTERVAL_SECS: u64 = 5;
const DEFAULT_CHECK_TIMEOUT_SECS: u64 = 2;
const DEFAULT_CHECK_ENDPOINT: &str = "https://8.8.8.8/";

/// Connectivity probing policy (`"network"` section of the policy document).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkPolicy {
    /// Minimum seconds between real probes; also the watcher tick period.
    pub check_interval: u64,
    /// Per-endpoint request timeout in seconds.
    pub check_timeout: u64,
    /// Endpoints tried in order; the first 2xx response wins.
    pub check_endpoints: Vec<String>,
}

impl Default for NetworkPolicy {
    fn default() -> Self {
        Self {
            check_interval: DEFAULT_CHECK_INTERVAL_SECS,
            check_timeout: DEFAULT_CHECK_TIMEOUT_SECS,
            check_endpoints: vec![DEFAULT_CHECK_ENDPOINT.to_string()],
        }
    }
}

impl NetworkPolicy {
    /// Clamp out-of-range values instead of rejecting the document.
    /// `check_interval` below 1s would turn the cache into a no-op and the
    /// tick loop into a busy loop; an empty endpoint list can never go online.
    fn sanitized(mut self) -> Self {
        if self.check_interval < 1 {
            self.check_interval = 1;
        }
        if self.check_endpoints.is_empty() {
            self.check_endpoints = vec![DEFAULT_CHECK_ENDPOINT.to_string()];
        }
        self
    }
}

/// Video playback policy (`"youtube"` section of the policy document).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct YoutubePolicy {
    /// Alternate frontend to build watch pages against (e.g. an Invidious
    /// instance). None = youtube.com.
    pub frontend_base: Option<String>,
}

/// The full policy document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub network: NetworkPolicy,
    pub youtube: YoutubePolicy,
}

impl Policy {
    /// Parse the policy document at `path`.
    pub fn try_load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let policy: Policy = serde_json::from_str(&contents)?;
        Ok(Self {
            network: policy.network.sanitized(),
            youtube: policy.youtube,
        })
    }

    /// Load the policy, falling back to built-in defaults when the file is
    /// missing or malformed.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(policy) => {
                info!(path = %path.display(), "policy loaded");
                policy
            }
            Err(e) => {
                error!(path = %path.display(), err = %e, "failed to load policy — using built-in defaults");
                Self::default()
            }
        }
    }
}
