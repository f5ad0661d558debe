//! Property tests for the mode reconciler's hysteresis rules.

use emberd::policy::YoutubePolicy;
use emberd::reconcile::Reconciler;
use emberd::state::{KioskMode, KioskState};
use proptest::prelude::*;

const OFFLINE: &str = "http://127.0.0.1:8080/offline";

fn reconciler() -> Reconciler {
    Reconciler::new(OFFLINE.to_string(), YoutubePolicy::default())
}

prop_compose! {
    /// An arbitrary state snapshot. URLs are either valid video references
    /// (generated from an ID), junk strings, or absent.
    fn arb_state()(
        mode in prop_oneof![Just(KioskMode::Online), Just(KioskMode::Offline)],
        url in prop_oneof![
            Just(None),
            "[A-Za-z0-9_-]{4,11}".prop_map(|id| Some(format!("https://youtu.be/{id}"))),
            ".{0,40}".prop_map(Some),
        ],
        stick in any::<bool>(),
    ) -> KioskState {
        KioskState {
            mode,
            last_online_url: url,
            selected_offline: None,
            stick_offline_until_manual: stick,
        }
    }
}

proptest! {
    // Rule 1: online mode without network always forces offline.
    #[test]
    fn online_without_network_always_goes_offline(state in arb_state()) {
        let mut state = state;
        state.mode = KioskMode::Online;
        let d = reconciler().decide(&state, false);
        prop_assert_eq!(d.mode, KioskMode::Offline);
        prop_assert_eq!(d.target_url, OFFLINE);
    }

    // Rule 2: offline mode with network, a valid video, and no stick flag
    // always restores online with a target derived from the stored URL.
    #[test]
    fn offline_with_network_and_video_restores_online(
        id in "[A-Za-z0-9_-]{4,11}",
    ) {
        let state = KioskState {
            mode: KioskMode::Offline,
            last_online_url: Some(format!("https://youtu.be/{id}")),
            selected_offline: None,
            stick_offline_until_manual: false,
        };
        let d = reconciler().decide(&state, true);
        prop_assert_eq!(d.mode, KioskMode::Online);
        prop_assert_eq!(d.target_url, format!("https://www.youtube.com/watch?v={id}"));
    }

    // Hysteresis: a stuck-offline state never flips online, whatever the
    // connectivity verdict or stored URL.
    #[test]
    fn stick_flag_always_holds(state in arb_state(), is_online in any::<bool>()) {
        let mut state = state;
        state.mode = KioskMode::Offline;
        state.stick_offline_until_manual = true;
        let d = reconciler().decide(&state, is_online);
        prop_assert_eq!(d.mode, KioskMode::Offline);
    }

    // The decision is a pure function: same inputs, same output.
    #[test]
    fn decide_is_deterministic(state in arb_state(), is_online in any::<bool>()) {
        let r = reconciler();
        let a = r.decide(&state, is_online);
        let b = r.decide(&state, is_online);
        prop_assert_eq!(a, b);
    }

    // Whatever happens, the target is either the offline player or a
    // full-page watch URL — never empty, never an embed.
    #[test]
    fn target_is_always_well_formed(state in arb_state(), is_online in any::<bool>()) {
        let d = reconciler().decide(&state, is_online);
        prop_assert!(
            d.target_url == OFFLINE || d.target_url.starts_with("https://www.youtube.com/watch?v="),
            "unexpected target: {}", d.target_url
        );
    }
}
