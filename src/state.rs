//! Read-only snapshot of the persisted kiosk state document.
//!
//! The state file is owned by the control-panel CRUD layer — this daemon only
//! ever reads it, once per reconciliation tick. A missing, malformed, or
//! partially-populated document degrades to a safe offline default instead of
//! stopping the loop.

use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// Which content the display should be showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KioskMode {
    Online,
    Offline,
}

impl Default for KioskMode {
    fn default() -> Self {
        Self::Offline
    }
}

impl std::fmt::Display for KioskMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Online => write!(f, "online"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

/// Per-tick snapshot of the persisted state document.
///
/// Fields the control panel writes but the watcher does not act on (volume,
/// mute, favorites, schedules) are simply not declared — serde ignores them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KioskState {
    #[serde(default)]
    pub mode: KioskMode,
    /// The video page last selected while online. Set by the control panel;
    /// used to auto-restore online mode when connectivity returns.
    #[serde(default)]
    pub last_online_url: Option<String>,
    /// Filename of the locally stored video chosen for offline playback.
    #[serde(default)]
    pub selected_offline: Option<String>,
    /// When true, a user explicitly switched offline and auto-restore must
    /// not fight that choice. Only the control panel ever clears this.
    #[serde(default)]
    pub stick_offline_until_manual: bool,
}

impl KioskState {
    /// Parse the state document at `path`.
    pub fn try_load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Load the state document, falling back to the offline default when the
    /// file is missing or fails validation.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(state) => state,
            Err(e) => {
                warn!(path = %path.display(), err = %e, "failed to load state — using offline defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_state(json: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(json.as_bytes()).unwrap();
        f
    }

    #[test]
    fn parses_full_document() {
        let f = write_state(
            r#"{
                "mode": "online",
                "last_online_url": "https://youtu.be/abc123",
                "selected_offline": "fire.mp4",
                "stick_offline_until_manual": false,
                "volume": 60,
                "muted": true,
                "version": "1.0"
            }"#,
        );
        let state = KioskState::try_load(f.path()).unwrap();
        assert_eq!(state.mode, KioskMode::Online);
        assert_eq!(state.last_online_url.as_deref(), Some("https://youtu.be/abc123"));
        assert_eq!(state.selected_offline.as_deref(), Some("fire.mp4"));
        assert!(!state.stick_offline_until_manual);
    }

    #[test]
    fn missing_fields_default_to_offline() {
        let f = write_state(r#"{"volume": 40}"#);
        let state = KioskState::try_load(f.path()).unwrap();
        assert_eq!(state.mode, KioskMode::Offline);
        assert!(state.last_online_url.is_none());
        assert!(!state.stick_offline_until_manual);
    }

    #[test]
    fn invalid_mode_falls_back_to_default() {
        let f = write_state(r#"{"mode": "party"}"#);
        assert!(KioskState::try_load(f.path()).is_err());
        let state = KioskState::load(f.path());
        assert_eq!(state.mode, KioskMode::Offline);
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let state = KioskState::load(Path::new("/nonexistent/state.json"));
        assert_eq!(state.mode, KioskMode::Offline);
    }
}
