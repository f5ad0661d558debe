//! The top-level reconciliation loop.
//!
//! One logical task drives everything: per tick it loads the persisted state
//! snapshot, asks the prober for a connectivity verdict, lets the reconciler
//! decide the desired target, and tells the supervisor to converge on it.
//! The prober and supervisor sit behind small traits so tests can drive
//! `tick` by hand against mocks instead of waiting on real timers.

use crate::backoff::{backoff_sleep, BackoffConfig};
use crate::connectivity::ConnectivityProber;
use crate::display::{DisplaySupervisor, LaunchError};
use crate::reconcile::Reconciler;
use crate::state::{KioskMode, KioskState};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info};

/// Connectivity seam — implemented by [`ConnectivityProber`].
#[async_trait]
pub trait Connectivity: Send {
    async fn check(&mut self) -> bool;
}

#[async_trait]
impl Connectivity for ConnectivityProber {
    async fn check(&mut self) -> bool {
        ConnectivityProber::check(self).await
    }
}

/// Display seam — implemented by [`DisplaySupervisor`].
#[async_trait]
pub trait Display: Send {
    async fn launch(&mut self, target: &str, is_video: bool) -> Result<(), LaunchError>;
    async fn stop(&mut self);
    fn is_running(&mut self) -> bool;
    fn current_target(&self) -> Option<&str>;
}

#[async_trait]
impl Display for DisplaySupervisor {
    async fn launch(&mut self, target: &str, is_video: bool) -> Result<(), LaunchError> {
        DisplaySupervisor::launch(self, target, is_video).await
    }

    async fn stop(&mut self) {
        DisplaySupervisor::stop(self).await;
    }

    fn is_running(&mut self) -> bool {
        DisplaySupervisor::is_running(self)
    }

    fn current_target(&self) -> Option<&str> {
        DisplaySupervisor::current_target(self)
    }
}

/// Watcher lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchState {
    /// Before the first launch attempt has completed.
    Starting,
    Running,
    /// Terminal — supervisor teardown runs exactly once here.
    Stopping,
}

pub struct Watcher<C: Connectivity, D: Display> {
    state_file: PathBuf,
    reconciler: Reconciler,
    prober: C,
    display: D,
    tick_interval: Duration,
    backoff: BackoffConfig,
    failed_launches: u32,
    state: WatchState,
}

impl<C: Connectivity, D: Display> Watcher<C, D> {
    pub fn new(
        state_file: PathBuf,
        reconciler: Reconciler,
        prober: C,
        display: D,
        tick_interval: Duration,
        backoff: BackoffConfig,
    ) -> Self {
        Self {
            state_file,
            reconciler,
            prober,
            display,
            tick_interval,
            backoff,
            failed_launches: 0,
            state: WatchState::Starting,
        }
    }

    /// One reconciliation pass: snapshot → probe → decide → converge.
    ///
    /// A failed launch never escalates out of the tick; it sleeps an
    /// extended backoff here so the loop cannot hot-spin against a crashing
    /// browser or an unavailable display.
    pub async fn tick(&mut self) {
        let snapshot = KioskState::load(&self.state_file);
        let is_online = self.prober.check().await;
        let decision = self.reconciler.decide(&snapshot, is_online);

        if decision.mode != snapshot.mode {
            match decision.mode {
                KioskMode::Offline if !is_online => {
                    info!("switching to offline mode (network unreachable)")
                }
                KioskMode::Offline => info!("falling back to offline mode (no usable online target)"),
                KioskMode::Online => info!("auto-restoring online mode"),
            }
        }

        let running = self.display.is_running();
        let same_target = self.display.current_target() == Some(decision.target_url.as_str());
        if running && same_target {
            return;
        }

        info!(mode = %decision.mode, target = %decision.target_url, "converging display on target");
        let is_video = decision.mode == KioskMode::Online;
        match self.display.launch(&decision.target_url, is_video).await {
            Ok(()) => {
                self.failed_launches = 0;
            }
            Err(e) => {
                error!(err = %e, attempt = self.failed_launches + 1, "kiosk launch failed — backing off");
                backoff_sleep(self.failed_launches, &self.backoff).await;
                self.failed_launches = self.failed_launches.saturating_add(1);
            }
        }
    }

    /// Drive ticks until a termination signal arrives, then tear down the
    /// supervised browser before returning.
    pub async fn run(mut self) -> anyhow::Result<()> {
        info!(period_secs = self.tick_interval.as_secs(), "kiosk watcher started");

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        // The first tick fires immediately and performs the initial launch.
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("shutdown signal received");
                    break;
                }

                _ = interval.tick() => {
                    self.tick().await;
                    if self.state == WatchState::Starting {
                        self.state = WatchState::Running;
                        debug!("watcher running");
                    }
                }
            }
        }

        self.state = WatchState::Stopping;
        info!("stopping kiosk watcher");
        self.display.stop().await;
        info!("kiosk watcher stopped");
        Ok(())
    }
}

/// Resolves when a termination signal is received.
///
/// On Unix this is SIGTERM *or* Ctrl-C; elsewhere Ctrl-C only.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
    }
}
