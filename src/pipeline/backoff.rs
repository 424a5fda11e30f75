use std::time::Duration;

/// Maps a finished attempt number to the wait before the next attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base: Duration,
}

impl BackoffPolicy {
    /// Wait `base * attempt` after attempt `attempt` (1-based)
    pub fn linear(base: Duration) -> Self {
        Self { base }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base.saturating_mul(attempt)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::linear(Duration::from_secs(5))
    }
}
