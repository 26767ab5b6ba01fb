use std::time::Duration;

use crate::config::{ScoutConfig, DEFAULT_MAX_ITERATIONS, DEFAULT_TOOL_TIMEOUT_MS};

/// Bounds applied to every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerLimits {
    /// Model invocations allowed per turn.
    pub max_iterations: usize,
    /// Upper bound on a single tool invocation.
    pub tool_timeout: Duration,
}

impl Default for RunnerLimits {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tool_timeout: Duration::from_millis(DEFAULT_TOOL_TIMEOUT_MS),
        }
    }
}

impl RunnerLimits {
    pub fn from_config(config: &ScoutConfig) -> Self {
        Self {
            max_iterations: config.max_iterations.max(1),
            tool_timeout: config.tool_timeout(),
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }
}
