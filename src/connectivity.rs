//! Network reachability prober.
//!
//! Issues bounded-timeout GET requests against the policy's endpoint list and
//! caches the verdict so back-to-back calls inside the check interval cost no
//! network I/O. Online/offline transitions are logged exactly once per
//! transition, never per check.

use crate::policy::NetworkPolicy;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const PROBE_USER_AGENT: &str = concat!("emberd-connectivity/", env!("CARGO_PKG_VERSION"));

/// Point-in-time view of the prober's state, for diagnostics.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct ConnectivitySnapshot {
    /// None until the first check completes.
    pub is_online: Option<bool>,
    /// Wall-clock time of the last completed check.
    pub last_checked_at: Option<DateTime<Utc>>,
}

pub struct ConnectivityProber {
    policy: NetworkPolicy,
    client: reqwest::Client,
    verdict: Option<bool>,
    last_check: Option<Instant>,
    last_checked_at: Option<DateTime<Utc>>,
}

impl ConnectivityProber {
    pub fn new(policy: NetworkPolicy) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(policy.check_timeout))
            .user_agent(PROBE_USER_AGENT)
            .build()
            .unwrap_or_default();
        Self {
            policy,
            client,
            verdict: None,
            last_check: None,
            last_checked_at: None,
        }
    }

    /// Check reachability, returning the cached verdict when the last
    /// completed check is newer than `check_interval`.
    ///
    /// Endpoints are tried in list order; the first 2xx response marks the
    /// system online and short-circuits the rest. Individual endpoint errors
    /// only mean "try the next one".
    pub async fn check(&mut self) -> bool {
        if let (Some(verdict), Some(checked)) = (self.verdict, self.last_check) {
            if checked.elapsed() < Duration::from_secs(self.policy.check_interval) {
                return verdict;
            }
        }

        for endpoint in &self.policy.check_endpoints {
            match self.client.get(endpoint).send().await {
                Ok(resp) if resp.status().is_success() => {
                    if self.verdict == Some(false) {
                        info!("network connectivity restored");
                    }
                    return self.record(true);
                }
                Ok(resp) => {
                    debug!(endpoint = %endpoint, status = %resp.status(), "probe endpoint returned non-success");
                }
                Err(e) => {
                    debug!(endpoint = %endpoint, err = %e, "probe endpoint unreachable");
                }
            }
        }

        if self.verdict == Some(true) {
            warn!("network connectivity lost");
        }
        self.record(false)
    }

    fn record(&mut self, verdict: bool) -> bool {
        self.verdict = Some(verdict);
        self.last_check = Some(Instant::now());
        self.last_checked_at = Some(Utc::now());
        verdict
    }

    pub fn snapshot(&self) -> ConnectivitySnapshot {
        ConnectivitySnapshot {
            is_online: self.verdict,
            last_checked_at: self.last_checked_at,
        }
    }
}
