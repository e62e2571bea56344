//! Retry policy for transient filesystem failures.
//!
//! Only permission errors are retried: on shared or synced folders they
//! usually mean another process briefly holds the file.

use std::io::ErrorKind;
use std::time::Duration;

use crate::config::PipelineConfig;

/// Whether an I/O failure is worth another attempt.
pub fn is_retryable(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::PermissionDenied)
}

/// Bounded attempts with a fixed delay between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_attempts: config.retry_attempts.max(1),
            backoff: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// `attempts` tries with no delay between them.
    pub fn immediate(attempts: u32) -> Self {
        Self {
            max_attempts: attempts.max(1),
            backoff: Duration::ZERO,
        }
    }

    /// Whether attempt number `attempt` (1-based) may be followed by another.
    pub fn should_retry(&self, attempt: u32, kind: ErrorKind) -> bool {
        attempt < self.max_attempts && is_retryable(kind)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}
