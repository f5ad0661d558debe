//! The online/offline mode decision.
//!
//! `decide` is a pure function of the persisted state snapshot and the
//! connectivity verdict — no I/O, no hidden state. The hysteresis rules live
//! here and nowhere else:
//!
//! 1. online mode with no network forces a switch to offline;
//! 2. offline mode with network back, a stored video and no manual stick
//!    auto-restores online;
//! 3. otherwise the persisted mode stands.

use crate::policy::YoutubePolicy;
use crate::state::{KioskMode, KioskState};
use crate::video;

/// The desired display mode and target for one tick. Recomputed fresh every
/// tick, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub mode: KioskMode,
    pub target_url: String,
}

pub struct Reconciler {
    offline_url: String,
    frontend_base: Option<String>,
}

impl Reconciler {
    pub fn new(offline_url: String, youtube: YoutubePolicy) -> Self {
        Self {
            offline_url,
            frontend_base: youtube.frontend_base,
        }
    }

    /// Decide the desired mode and target URL for the given snapshot.
    pub fn decide(&self, state: &KioskState, is_online: bool) -> Decision {
        // Rule 1: the network went away under online mode.
        if state.mode == KioskMode::Online && !is_online {
            return self.offline_decision();
        }

        // Rule 2: network is back, a video is remembered, and the user did
        // not pin offline mode. The stick flag is read here, never written —
        // clearing it is the control panel's job.
        if state.mode == KioskMode::Offline && is_online && !state.stick_offline_until_manual {
            if let Some(target) = self.online_target(state) {
                return Decision {
                    mode: KioskMode::Online,
                    target_url: target,
                };
            }
        }

        // Rule 3: keep the persisted mode. Online mode without a usable video
        // reference still degrades to the offline player rather than pointing
        // the display at nothing.
        match state.mode {
            KioskMode::Online => match self.online_target(state) {
                Some(target) => Decision {
                    mode: KioskMode::Online,
                    target_url: target,
                },
                None => self.offline_decision(),
            },
            KioskMode::Offline => self.offline_decision(),
        }
    }

    /// Full-page watch URL for the remembered video, if it parses.
    fn online_target(&self, state: &KioskState) -> Option<String> {
        state
            .last_online_url
            .as_deref()
            .and_then(|url| video::full_page_target(url, self.frontend_base.as_deref()))
    }

    fn offline_decision(&self) -> Decision {
        Decision {
            mode: KioskMode::Offline,
            target_url: self.offline_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFFLINE: &str = "http://127.0.0.1:8080/offline";

    fn reconciler() -> Reconciler {
        Reconciler::new(OFFLINE.to_string(), YoutubePolicy::default())
    }

    fn state(mode: KioskMode, url: Option<&str>, stick: bool) -> KioskState {
        KioskState {
            mode,
            last_online_url: url.map(str::to_string),
            selected_offline: None,
            stick_offline_until_manual: stick,
        }
    }

    #[test]
    fn offline_mode_stays_offline_even_with_network() {
        // Scenario 1 — with no remembered video there is nothing to restore.
        let d = reconciler().decide(&state(KioskMode::Offline, None, false), true);
        assert_eq!(d.mode, KioskMode::Offline);
        assert_eq!(d.target_url, OFFLINE);
    }

    #[test]
    fn network_loss_forces_offline() {
        // Scenario 2
        let d = reconciler().decide(
            &state(KioskMode::Online, Some("https://youtu.be/abc123"), false),
            false,
        );
        assert_eq!(d.mode, KioskMode::Offline);
        assert_eq!(d.target_url, OFFLINE);
    }

    #[test]
    fn network_return_auto_restores_online() {
        // Scenario 3
        let d = reconciler().decide(
            &state(KioskMode::Offline, Some("https://youtu.be/abc123"), false),
            true,
        );
        assert_eq!(d.mode, KioskMode::Online);
        assert_eq!(d.target_url, "https://www.youtube.com/watch?v=abc123");
    }

    #[test]
    fn stick_flag_blocks_auto_restore() {
        let d = reconciler().decide(
            &state(KioskMode::Offline, Some("https://youtu.be/abc123"), true),
            true,
        );
        assert_eq!(d.mode, KioskMode::Offline);
        assert_eq!(d.target_url, OFFLINE);
    }

    #[test]
    fn online_mode_without_url_falls_back_to_offline_target() {
        let d = reconciler().decide(&state(KioskMode::Online, None, false), true);
        assert_eq!(d.mode, KioskMode::Offline);
        assert_eq!(d.target_url, OFFLINE);
    }

    #[test]
    fn online_mode_with_unparseable_url_falls_back() {
        let d = reconciler().decide(
            &state(KioskMode::Online, Some("https://example.com/not-a-video"), false),
            true,
        );
        assert_eq!(d.mode, KioskMode::Offline);
        assert_eq!(d.target_url, OFFLINE);
    }

    #[test]
    fn online_mode_keeps_running_video_while_online() {
        let d = reconciler().decide(
            &state(KioskMode::Online, Some("https://youtu.be/abc123"), false),
            true,
        );
        assert_eq!(d.mode, KioskMode::Online);
        assert_eq!(d.target_url, "https://www.youtube.com/watch?v=abc123");
    }

    #[test]
    fn frontend_base_rewrites_watch_host() {
        let r = Reconciler::new(
            OFFLINE.to_string(),
            YoutubePolicy {
                frontend_base: Some("https://yewtu.be".to_string()),
            },
        );
        let d = r.decide(
            &state(KioskMode::Offline, Some("https://youtu.be/abc123"), false),
            true,
        );
        assert_eq!(d.target_url, "https://yewtu.be/watch?v=abc123");
    }
}
