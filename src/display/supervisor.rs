//! Kiosk browser process supervision.
//!
//! Owns the lifecycle of exactly one child browser process. A launch for a
//! new target always fully stops the previous process first — two kiosk
//! browsers never run concurrently. The child is placed in its own session so
//! stop() can signal the whole process group and take the browser's own
//! subprocesses down with it.

use super::{automate, detect_browser, DisplayConfig, DisplayEnv, LaunchError};
use std::collections::VecDeque;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Lines of child stderr kept for crash diagnostics.
const STDERR_TAIL_LINES: usize = 40;

/// Shared tail buffer of the child's stderr output.
type StderrTail = Arc<Mutex<VecDeque<String>>>;

struct SupervisedProcess {
    child: Child,
    target: String,
    is_video: bool,
}

pub struct DisplaySupervisor {
    cfg: DisplayConfig,
    env: DisplayEnv,
    process: Option<SupervisedProcess>,
}

impl DisplaySupervisor {
    pub fn new(cfg: DisplayConfig, env: DisplayEnv) -> Self {
        Self {
            cfg,
            env,
            process: None,
        }
    }

    /// Launch the kiosk browser pointed at `target`.
    ///
    /// Idempotent: a live process already showing `target` is left alone.
    /// Otherwise any existing process is fully stopped before the new one is
    /// spawned. After a settle delay the child's liveness is re-checked; an
    /// immediate death is reported as a failure with its stderr tail logged.
    pub async fn launch(&mut self, target: &str, is_video: bool) -> Result<(), LaunchError> {
        if self.is_running() && self.current_target() == Some(target) {
            debug!(target = %target, "browser already showing target");
            return Ok(());
        }

        self.stop().await;

        let binary = match &self.cfg.browser {
            Some(b) => b.clone(),
            None => detect_browser().ok_or(LaunchError::NoBrowser)?,
        };

        let mut cmd = Command::new(&binary);
        cmd.args(self.kiosk_flags())
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        self.env.apply(&mut cmd);

        // New session: the child becomes a process-group leader so stop()
        // can signal the group and reach the browser's own subprocesses.
        #[cfg(unix)]
        unsafe {
            cmd.pre_exec(|| {
                libc::setsid();
                Ok(())
            });
        }

        info!(binary = %binary, target = %target, "launching kiosk browser");
        let mut child = cmd.spawn().map_err(|source| LaunchError::Spawn {
            binary: binary.clone(),
            source,
        })?;

        let stderr_tail = spawn_stderr_drain(&mut child);

        // Give the browser time to either come up or crash on startup.
        tokio::time::sleep(Duration::from_millis(self.cfg.settle_delay_ms)).await;

        match child.try_wait() {
            Ok(Some(status)) => {
                let tail = drain_tail(&stderr_tail);
                error!(status = %status, stderr = %tail, "browser exited during startup");
                Err(LaunchError::DiedOnStartup { status })
            }
            Err(e) => {
                warn!(err = %e, "could not confirm browser liveness — treating launch as failed");
                let _ = child.start_kill();
                let _ = child.wait().await;
                Err(LaunchError::Spawn { binary, source: e })
            }
            Ok(None) => {
                info!(pid = child.id().unwrap_or(0), target = %target, "kiosk browser started");
                if is_video && self.cfg.automation {
                    let env = self.env.clone();
                    let screen = (self.cfg.screen_width, self.cfg.screen_height);
                    tokio::spawn(automate::run_sequence(env, screen));
                }
                self.process = Some(SupervisedProcess {
                    child,
                    target: target.to_string(),
                    is_video,
                });
                Ok(())
            }
        }
    }

    /// Stop the running browser, escalating from a graceful group signal to a
    /// forced kill after the grace period. Safe to call when nothing runs;
    /// the stored handle and target are always cleared.
    pub async fn stop(&mut self) {
        let Some(mut proc) = self.process.take() else {
            return;
        };
        info!(target = %proc.target, "stopping kiosk browser");

        let pid = proc.child.id();
        terminate_group(pid, &mut proc.child);

        let grace = Duration::from_millis(self.cfg.stop_grace_ms);
        match timeout(grace, proc.child.wait()).await {
            Ok(_) => info!("kiosk browser stopped"),
            Err(_) => {
                warn!(grace_ms = self.cfg.stop_grace_ms, "browser ignored termination — forcing kill");
                kill_group(pid);
                let _ = proc.child.kill().await;
                let _ = proc.child.wait().await;
            }
        }
    }

    /// Stop and relaunch the current target. Returns false when nothing was
    /// running to restart.
    pub async fn restart(&mut self) -> Result<bool, LaunchError> {
        let Some((target, is_video)) = self
            .process
            .as_ref()
            .map(|p| (p.target.clone(), p.is_video))
        else {
            return Ok(false);
        };
        self.stop().await;
        self.launch(&target, is_video).await?;
        Ok(true)
    }

    /// Non-blocking liveness probe. False when no handle is stored or the
    /// child has already exited. A handle whose child died on its own is
    /// cleared here, so `current_target` only ever names a live process.
    pub fn is_running(&mut self) -> bool {
        let alive = match self.process.as_mut() {
            Some(proc) => matches!(proc.child.try_wait(), Ok(None)),
            None => return false,
        };
        if !alive {
            if let Some(proc) = self.process.take() {
                info!(target = %proc.target, "kiosk browser exited on its own");
            }
        }
        alive
    }

    /// URL of the most recently launched process, if one is stored.
    pub fn current_target(&self) -> Option<&str> {
        self.process.as_ref().map(|p| p.target.as_str())
    }

    /// PID of the supervised child, for diagnostics and tests.
    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().and_then(|p| p.child.id())
    }

    /// The fixed kiosk flag set. The target URL is appended as the final
    /// argument by `launch`.
    fn kiosk_flags(&self) -> Vec<String> {
        vec![
            "--kiosk".to_string(),
            "--noerrdialogs".to_string(),
            "--disable-session-crashed-bubble".to_string(),
            "--disable-infobars".to_string(),
            "--autoplay-policy=no-user-gesture-required".to_string(),
            "--start-fullscreen".to_string(),
            "--overscroll-history-navigation=0".to_string(),
            "--disable-features=TranslateUI".to_string(),
            "--disable-background-timer-throttling".to_string(),
            format!("--user-data-dir={}", self.cfg.profile_dir.display()),
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-default-apps".to_string(),
        ]
    }
}

/// Drain child stderr into a bounded tail buffer so the child can never block
/// on a full pipe and crash diagnostics survive an immediate exit.
fn spawn_stderr_drain(child: &mut Child) -> StderrTail {
    let tail: StderrTail = Arc::new(Mutex::new(VecDeque::with_capacity(STDERR_TAIL_LINES)));
    if let Some(stderr) = child.stderr.take() {
        let tail = tail.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let mut buf = tail.lock().unwrap_or_else(|p| p.into_inner());
                if buf.len() >= STDERR_TAIL_LINES {
                    buf.pop_front();
                }
                buf.push_back(line);
            }
        });
    }
    tail
}

fn drain_tail(tail: &StderrTail) -> String {
    let buf = tail.lock().unwrap_or_else(|p| p.into_inner());
    buf.iter().cloned().collect::<Vec<_>>().join("\n")
}

/// Send SIGTERM to the child's process group (the child is its group leader
/// after setsid). Falls back to signalling the child alone off Unix.
fn terminate_group(pid: Option<u32>, child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = pid {
            unsafe {
                libc::killpg(pid as libc::pid_t, libc::SIGTERM);
            }
            return;
        }
    }
    let _ = pid;
    let _ = child.start_kill();
}

/// Escalation: SIGKILL to the whole group.
fn kill_group(pid: Option<u32>) {
    #[cfg(unix)]
    if let Some(pid) = pid {
        unsafe {
            libc::killpg(pid as libc::pid_t, libc::SIGKILL);
        }
    }
    #[cfg(not(unix))]
    let _ = pid;
}
