//! Resource limits for script execution
//!
//! Scripts may loop forever on purpose (`while true` waiting on external
//! state), so there is no iteration cap. The only backstops are the caller's
//! cancellation token and the optional wall-clock timeout configured here.

use std::time::Duration;

/// Resource limits for script execution
#[derive(Debug, Clone, Default)]
pub struct ExecutionLimits {
    /// Wall-clock limit for a whole run
    /// Default: none
    pub timeout: Option<Duration>,
}

impl ExecutionLimits {
    /// Create new limits with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set execution timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
