//! Synthetic input sequence for freshly launched video pages.
//!
//! Video watch pages need a nudge before they behave like a fireplace: an
//! overlay-dismissing click, a play keypress, theatre mode off, fullscreen
//! on, and the cursor parked out of sight. The whole sequence is cosmetic —
//! any failure aborts the remaining steps and is logged, but the launch that
//! triggered it stays successful.

use super::DisplayEnv;
use anyhow::{bail, Context as _};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Wait for the watch page to finish loading before the first input.
const PAGE_SETTLE: Duration = Duration::from_secs(8);
/// Pause between consecutive input steps.
const STEP_DELAY: Duration = Duration::from_secs(2);
/// Hard cap on a single synthetic-input invocation.
const STEP_TIMEOUT: Duration = Duration::from_secs(5);

const INPUT_TOOL: &str = "xdotool";

/// Run the scripted input sequence against the active display.
///
/// Fire-and-forget: callers spawn this and never await the outcome.
pub async fn run_sequence(env: DisplayEnv, screen: (u32, u32)) {
    let (width, height) = screen;
    let center_x = (width / 2).to_string();
    let center_y = (height / 2).to_string();
    let park_x = width.saturating_sub(1).to_string();
    let park_y = height.saturating_sub(1).to_string();

    let steps: [(&str, Vec<&str>); 5] = [
        // Click near screen center: dismisses overlays and focuses the player.
        (
            "focus click",
            vec!["mousemove", center_x.as_str(), center_y.as_str(), "click", "1"],
        ),
        ("toggle play", vec!["key", "k"]),
        ("exit theatre mode", vec!["key", "t"]),
        ("toggle fullscreen", vec!["key", "f"]),
        // Park the cursor in the corner so it is not drawn over the video.
        (
            "park cursor",
            vec!["mousemove", park_x.as_str(), park_y.as_str()],
        ),
    ];

    tokio::time::sleep(PAGE_SETTLE).await;

    for (i, (label, args)) in steps.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(STEP_DELAY).await;
        }
        if let Err(e) = run_step(&env, args).await {
            warn!(step = %label, err = %e, "input automation aborted");
            return;
        }
        debug!(step = %label, "input automation step done");
    }
    debug!("input automation sequence complete");
}

async fn run_step(env: &DisplayEnv, args: &[&str]) -> anyhow::Result<()> {
    let mut cmd = Command::new(INPUT_TOOL);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    env.apply(&mut cmd);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("failed to spawn `{INPUT_TOOL}` — is it installed?"))?;

    match timeout(STEP_TIMEOUT, child.wait()).await {
        Err(_) => {
            let _ = child.kill().await;
            bail!("{INPUT_TOOL} timed out after {}s", STEP_TIMEOUT.as_secs());
        }
        Ok(Err(e)) => Err(e).context(format!("waiting on `{INPUT_TOOL}` failed")),
        Ok(Ok(status)) if !status.success() => {
            bail!("{INPUT_TOOL} exited with {status}");
        }
        Ok(Ok(_)) => Ok(()),
    }
}
