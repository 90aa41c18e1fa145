//! Exponential retry delay with jitter for background polling.
//!
//! A failing fleet provider should not be hammered on every tick; each
//! consecutive failure doubles the wait up to a ceiling.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

const JITTER_RATIO: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    failures: u32,
    resume_at: Instant,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        let base = base.max(Duration::from_millis(1));
        Self {
            base,
            max: max.max(base),
            failures: 0,
            resume_at: Instant::now(),
        }
    }

    /// True once the current delay has elapsed.
    pub fn ready(&self) -> bool {
        Instant::now() >= self.resume_at
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn reset(&mut self) {
        self.failures = 0;
        self.resume_at = Instant::now();
    }

    /// Record a failure and return how long to wait before the next attempt.
    pub fn fail(&mut self) -> Duration {
        self.failures = self.failures.saturating_add(1);
        let delay = with_jitter(self.delay_for(self.failures));
        self.resume_at = Instant::now() + delay;
        delay
    }

    /// Un-jittered delay after `failures` consecutive failures: `base * 2^failures`, capped.
    fn delay_for(&self, failures: u32) -> Duration {
        let factor = 1u32.checked_shl(failures.min(31)).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max)
    }
}

/// Add up to `JITTER_RATIO` of `delay`, seeded from the clock's sub-second part.
fn with_jitter(delay: Duration) -> Duration {
    let spread_ms = (delay.as_millis() as f64 * JITTER_RATIO) as u64;
    if spread_ms == 0 {
        return delay;
    }
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::from(elapsed.subsec_nanos()))
        .unwrap_or(0);
    delay + Duration::from_millis(seed % (spread_ms + 1))
}
