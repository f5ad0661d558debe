//! Pre-flight diagnostic checks for `emberd doctor`.
//!
//! Runs before the watcher starts, so an operator can catch a missing browser
//! binary or an unreadable document before they turn into confusing launch
//! failures on a headless box.

use crate::config::WatcherConfig;
use crate::display::{self, DisplayEnv};
use crate::policy::Policy;
use crate::state::KioskState;

/// The result of a single diagnostic check.
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

/// Run all diagnostic checks and return a list of results.
pub fn run_doctor(cfg: &WatcherConfig) -> Vec<CheckResult> {
    vec![
        check_browser(cfg),
        check_input_tool(),
        check_display_env(),
        check_state_document(cfg),
        check_policy_document(cfg),
    ]
}

// ─── Individual checks ───────────────────────────────────────────────────────

fn check_browser(cfg: &WatcherConfig) -> CheckResult {
    let (passed, detail) = match &cfg.display.browser {
        Some(binary) => (
            display::find_on_path(binary) || std::path::Path::new(binary).is_file(),
            format!("configured binary: {binary}"),
        ),
        None => match display::detect_browser() {
            Some(binary) => (true, format!("detected on PATH: {binary}")),
            None => (false, "no kiosk browser found on PATH".to_string()),
        },
    };
    CheckResult {
        name: "kiosk browser",
        passed,
        detail,
    }
}

fn check_input_tool() -> CheckResult {
    let passed = display::find_on_path("xdotool");
    CheckResult {
        name: "input automation tool",
        passed,
        detail: if passed {
            "xdotool found on PATH".to_string()
        } else {
            "xdotool not found — video-page automation will be skipped".to_string()
        },
    }
}

fn check_display_env() -> CheckResult {
    let env = DisplayEnv::resolve();
    let detail = match &env.xauthority {
        Some(path) => format!("DISPLAY={} XAUTHORITY={}", env.display, path.display()),
        None => format!("DISPLAY={} (no Xauthority candidate found)", env.display),
    };
    CheckResult {
        name: "display environment",
        // A missing credential file is survivable; an empty display target is not.
        passed: !env.display.is_empty(),
        detail,
    }
}

fn check_state_document(cfg: &WatcherConfig) -> CheckResult {
    match KioskState::try_load(&cfg.state_file) {
        Ok(state) => CheckResult {
            name: "state document",
            passed: true,
            detail: format!("{} (mode: {})", cfg.state_file.display(), state.mode),
        },
        Err(e) => CheckResult {
            name: "state document",
            passed: false,
            detail: format!("{}: {e} (watcher will run with offline defaults)", cfg.state_file.display()),
        },
    }
}

fn check_policy_document(cfg: &WatcherConfig) -> CheckResult {
    match Policy::try_load(&cfg.policy_file) {
        Ok(policy) => CheckResult {
            name: "policy document",
            passed: true,
            detail: format!(
                "{} ({} endpoint(s), every {}s)",
                cfg.policy_file.display(),
                policy.network.check_endpoints.len(),
                policy.network.check_interval
            ),
        },
        Err(e) => CheckResult {
            name: "policy document",
            passed: false,
            detail: format!("{}: {e} (watcher will run with built-in defaults)", cfg.policy_file.display()),
        },
    }
}

/// Print results in a human-readable table.
pub fn print_doctor_results(results: &[CheckResult]) {
    println!("emberd doctor\n");
    for r in results {
        let mark = if r.passed { "ok" } else { "FAIL" };
        println!("  [{mark:>4}] {:<24} {}", r.name, r.detail);
    }
    let failed = results.iter().filter(|r| !r.passed).count();
    println!();
    if failed == 0 {
        println!("all checks passed");
    } else {
        println!("{failed} check(s) failed");
    }
}
