//! Core run types for the agent loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use crate::types::Usage;

/// Unique run identifier.
pub type RunId = Uuid;

/// How a run (one conversational turn) ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunStatus {
    /// The model produced a final answer without tool calls.
    Completed,
    /// Model invocation or store access failed.
    Failed,
    /// The subscriber went away.
    Canceled,
    /// The loop bound was reached before a final answer.
    IterationLimit,
}

/// Result of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Model invocations made during the run.
    pub iterations: usize,
    #[serde(default)]
    pub usage: Usage,
    pub finished_at: DateTime<Utc>,
}

impl RunResult {
    fn with_status(status: RunStatus, error: Option<String>) -> Self {
        Self {
            status,
            error,
            iterations: 0,
            usage: Usage::default(),
            finished_at: Utc::now(),
        }
    }

    pub fn completed() -> Self {
        Self::with_status(RunStatus::Completed, None)
    }

    pub fn canceled() -> Self {
        Self::with_status(RunStatus::Canceled, None)
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::with_status(RunStatus::Failed, Some(error.into()))
    }

    pub fn iteration_limit(max_iterations: usize) -> Self {
        Self::with_status(
            RunStatus::IterationLimit,
            Some(format!(
                "tool loop exceeded max iterations (max_iterations={max_iterations})"
            )),
        )
    }

    pub(crate) fn with_progress(mut self, iterations: usize, usage: Usage) -> Self {
        self.iterations = iterations;
        self.usage = usage;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(RunStatus::IterationLimit).unwrap(),
            "iteration_limit"
        );
        assert_eq!(RunStatus::Canceled.to_string(), "canceled");
    }

    #[test]
    fn iteration_limit_reports_the_bound() {
        let result = RunResult::iteration_limit(10);
        assert_eq!(result.status, RunStatus::IterationLimit);
        assert!(result.error.unwrap().contains("max_iterations=10"));
        assert!(!RunResult::failed("x").is_success());
    }
}
