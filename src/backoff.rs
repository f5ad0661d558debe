//! Exponential backoff for failed browser launches.
//!
//! A crashing browser binary or an unavailable display would otherwise turn
//! the tick loop into a hot spawn loop. Formula:
//! `min(base * multiplier^attempt, max) + jitter`.

use std::time::Duration;

/// Configuration for launch-failure backoff.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Initial backoff in milliseconds.
    pub base_ms: u64,
    /// Maximum backoff cap in milliseconds.
    pub max_ms: u64,
    /// Exponential growth multiplier per attempt.
    pub multiplier: f64,
    /// Jitter as a fraction of the computed backoff (0.0–1.0).
    pub jitter_fraction: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_ms: 5_000,
            max_ms: 120_000,
            multiplier: 2.0,
            jitter_fraction: 0.25,
        }
    }
}

/// Calculate the backoff duration for `attempt` (0-indexed).
pub fn next_backoff(attempt: u32, config: &BackoffConfig) -> Duration {
    let raw = config.base_ms as f64 * config.multiplier.powi(attempt as i32);
    let capped = raw.min(config.max_ms as f64);

    // Deterministic pseudo-jitter derived from the attempt number — spreads
    // restart storms without pulling in a rand dependency.
    let jitter = pseudo_rand(attempt) * capped * config.jitter_fraction;
    let with_jitter = (capped + jitter).max(0.0);

    Duration::from_millis(with_jitter as u64)
}

/// Async sleep for the computed backoff duration.
pub async fn backoff_sleep(attempt: u32, config: &BackoffConfig) {
    tokio::time::sleep(next_backoff(attempt, config)).await;
}

/// Map `attempt` to a float in [-0.5, 0.5) with a single LCG step.
fn pseudo_rand(attempt: u32) -> f64 {
    // LCG parameters (Numerical Recipes)
    const A: u64 = 1_664_525;
    const C: u64 = 1_013_904_223;
    const M: u64 = 1u64 << 32;
    let state = A.wrapping_mul(attempt as u64).wrapping_add(C) % M;
    (state as f64 / M as f64) - 0.5
}
