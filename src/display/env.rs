//! X display environment discovery.
//!
//! The watcher usually runs as a systemd service with no inherited X
//! environment, so the display target and the Xauthority credential file are
//! resolved by trying an ordered list of candidates: the process environment
//! first, then the current user's home, then the accounts a kiosk image
//! typically runs the desktop session under.

use std::path::PathBuf;
use tracing::{debug, warn};

const DEFAULT_DISPLAY: &str = ":0";

/// Resolved environment for processes that talk to the X display.
#[derive(Debug, Clone)]
pub struct DisplayEnv {
    pub display: String,
    /// None when no candidate credential file exists; launch proceeds without
    /// it and relies on host-level access control.
    pub xauthority: Option<PathBuf>,
}

impl DisplayEnv {
    /// Resolve from the process environment and well-known locations.
    pub fn resolve() -> Self {
        let display = std::env::var("DISPLAY")
            .ok()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| DEFAULT_DISPLAY.to_string());

        let candidates = xauthority_candidates();
        let xauthority = first_existing(&candidates);
        match &xauthority {
            Some(path) => debug!(path = %path.display(), "Xauthority resolved"),
            None => warn!("no Xauthority candidate found — browser will launch without display credentials"),
        }

        Self {
            display,
            xauthority,
        }
    }

    /// Export `DISPLAY` / `XAUTHORITY` into a command's environment.
    pub fn apply(&self, cmd: &mut tokio::process::Command) {
        cmd.env("DISPLAY", &self.display);
        if let Some(xauth) = &self.xauthority {
            cmd.env("XAUTHORITY", xauth);
        }
    }
}

/// Ordered candidate locations for the Xauthority file.
fn xauthority_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(explicit) = std::env::var("XAUTHORITY") {
        if !explicit.is_empty() {
            candidates.push(PathBuf::from(explicit));
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        candidates.push(PathBuf::from(home).join(".Xauthority"));
    }
    // Accounts the desktop session commonly runs under on kiosk images.
    for account in ["/home/pi", "/home/kiosk", "/root"] {
        candidates.push(PathBuf::from(account).join(".Xauthority"));
    }
    candidates
}

/// First candidate that exists as a regular file, in order.
fn first_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|p| p.is_file()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_existing_respects_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.xauth");
        let b = dir.path().join("b.xauth");
        std::fs::write(&a, b"").unwrap();
        std::fs::write(&b, b"").unwrap();

        let found = first_existing(&[a.clone(), b.clone()]);
        assert_eq!(found, Some(a));
    }

    #[test]
    fn first_existing_skips_missing_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.xauth");
        let present = dir.path().join("present.xauth");
        std::fs::write(&present, b"").unwrap();

        let found = first_existing(&[missing, present.clone()]);
        assert_eq!(found, Some(present));
    }

    #[test]
    fn first_existing_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let found = first_existing(&[dir.path().join("nope.xauth")]);
        assert_eq!(found, None);
    }
}
