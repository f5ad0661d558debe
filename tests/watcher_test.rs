//! Integration tests for the watcher tick loop.
//!
//! The prober and supervisor are replaced by mocks behind the
//! `Connectivity`/`Display` seams, so ticks are driven by hand — no timers,
//! no subprocesses, no network.

use async_trait::async_trait;
use emberd::backoff::BackoffConfig;
use emberd::display::LaunchError;
use emberd::policy::YoutubePolicy;
use emberd::reconcile::Reconciler;
use emberd::watcher::{Connectivity, Display, Watcher};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

const OFFLINE: &str = "http://127.0.0.1:8080/offline";

struct FakeProber {
    online: bool,
}

#[async_trait]
impl Connectivity for FakeProber {
    async fn check(&mut self) -> bool {
        self.online
    }
}

#[derive(Default, Clone)]
struct DisplayLog {
    launches: Arc<Mutex<Vec<(String, bool)>>>,
    stops: Arc<Mutex<usize>>,
}

struct FakeDisplay {
    log: DisplayLog,
    running: bool,
    target: Option<String>,
    fail_launches: bool,
}

impl FakeDisplay {
    fn new(log: DisplayLog) -> Self {
        Self {
            log,
            running: false,
            target: None,
            fail_launches: false,
        }
    }
}

#[async_trait]
impl Display for FakeDisplay {
    async fn launch(&mut self, target: &str, is_video: bool) -> Result<(), LaunchError> {
        self.log
            .launches
            .lock()
            .unwrap()
            .push((target.to_string(), is_video));
        if self.fail_launches {
            return Err(LaunchError::NoBrowser);
        }
        self.running = true;
        self.target = Some(target.to_string());
        Ok(())
    }

    async fn stop(&mut self) {
        *self.log.stops.lock().unwrap() += 1;
        self.running = false;
        self.target = None;
    }

    fn is_running(&mut self) -> bool {
        self.running
    }

    fn current_target(&self) -> Option<&str> {
        self.target.as_deref()
    }
}

/// Backoff shrunk to microscopic values so failure ticks stay fast.
fn tiny_backoff() -> BackoffConfig {
    BackoffConfig {
        base_ms: 1,
        max_ms: 2,
        multiplier: 1.0,
        jitter_fraction: 0.0,
    }
}

fn write_state(dir: &TempDir, json: &str) -> PathBuf {
    let path = dir.path().join("state.json");
    std::fs::write(&path, json).unwrap();
    path
}

fn make_watcher(
    state_file: PathBuf,
    online: bool,
    display: FakeDisplay,
) -> Watcher<FakeProber, FakeDisplay> {
    Watcher::new(
        state_file,
        Reconciler::new(OFFLINE.to_string(), YoutubePolicy::default()),
        FakeProber { online },
        display,
        Duration::from_secs(5),
        tiny_backoff(),
    )
}

#[tokio::test]
async fn first_tick_launches_the_offline_player() {
    let dir = TempDir::new().unwrap();
    let state = write_state(&dir, r#"{"mode": "offline"}"#);
    let log = DisplayLog::default();
    let mut watcher = make_watcher(state, true, FakeDisplay::new(log.clone()));

    watcher.tick().await;

    let launches = log.launches.lock().unwrap();
    assert_eq!(launches.len(), 1);
    assert_eq!(launches[0], (OFFLINE.to_string(), false));
}

#[tokio::test]
async fn converged_display_is_left_alone() {
    let dir = TempDir::new().unwrap();
    let state = write_state(&dir, r#"{"mode": "offline"}"#);
    let log = DisplayLog::default();
    let mut watcher = make_watcher(state, true, FakeDisplay::new(log.clone()));

    watcher.tick().await;
    watcher.tick().await;
    watcher.tick().await;

    assert_eq!(
        log.launches.lock().unwrap().len(),
        1,
        "a display already on target must not be relaunched"
    );
}

#[tokio::test]
async fn state_change_switches_the_target() {
    let dir = TempDir::new().unwrap();
    let state = write_state(&dir, r#"{"mode": "offline"}"#);
    let log = DisplayLog::default();
    let mut watcher = make_watcher(state.clone(), true, FakeDisplay::new(log.clone()));

    watcher.tick().await;

    // Control panel flips to online with a remembered video.
    std::fs::write(
        &state,
        r#"{"mode": "online", "last_online_url": "https://youtu.be/abc123"}"#,
    )
    .unwrap();
    watcher.tick().await;

    let launches = log.launches.lock().unwrap();
    assert_eq!(launches.len(), 2);
    assert_eq!(
        launches[1],
        ("https://www.youtube.com/watch?v=abc123".to_string(), true),
        "online targets must be flagged as video pages"
    );
}

#[tokio::test]
async fn network_loss_converges_back_to_offline() {
    let dir = TempDir::new().unwrap();
    let state = write_state(
        &dir,
        r#"{"mode": "online", "last_online_url": "https://youtu.be/abc123"}"#,
    );
    let log = DisplayLog::default();
    let mut watcher = make_watcher(state, false, FakeDisplay::new(log.clone()));

    watcher.tick().await;

    let launches = log.launches.lock().unwrap();
    assert_eq!(launches.len(), 1);
    assert_eq!(launches[0], (OFFLINE.to_string(), false));
}

#[tokio::test]
async fn launch_failure_does_not_panic_and_retries_next_tick() {
    let dir = TempDir::new().unwrap();
    let state = write_state(&dir, r#"{"mode": "offline"}"#);
    let log = DisplayLog::default();
    let mut display = FakeDisplay::new(log.clone());
    display.fail_launches = true;
    let mut watcher = make_watcher(state, true, display);

    // Each failing tick logs, backs off, and leaves the loop alive.
    watcher.tick().await;
    watcher.tick().await;
    watcher.tick().await;

    assert_eq!(
        log.launches.lock().unwrap().len(),
        3,
        "every tick must retry the launch after a failure"
    );
}

#[tokio::test]
async fn unreadable_state_still_produces_the_offline_target() {
    let dir = TempDir::new().unwrap();
    let state = write_state(&dir, "{corrupt");
    let log = DisplayLog::default();
    let mut watcher = make_watcher(state, true, FakeDisplay::new(log.clone()));

    watcher.tick().await;

    let launches = log.launches.lock().unwrap();
    assert_eq!(launches.len(), 1, "corrupt state must still produce one launch");
    assert_eq!(
        launches[0],
        (OFFLINE.to_string(), false),
        "corrupt state must degrade to the offline player"
    );
}
