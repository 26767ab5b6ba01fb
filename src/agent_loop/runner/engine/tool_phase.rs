use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use super::super::control::AgentEventEmitter;
use super::super::tooling::{execute_tool_calls, ToolExecutionOutcome};
use crate::tools::ToolRegistry;
use crate::types::{AgentToolCall, ModelMessage};

pub(super) enum ToolPhaseOutcome {
    /// One tool-result message per call, in call order.
    Completed(Vec<ModelMessage>),
    Canceled,
}

pub(super) async fn run_tool_phase(
    registry: &ToolRegistry,
    session_id: &str,
    tool_calls: &[AgentToolCall],
    timeout: Duration,
    emitter: &AgentEventEmitter,
    cancel: &CancellationToken,
) -> ToolPhaseOutcome {
    // Dropping the join future on cancel drops every in-flight invocation.
    let outcomes = tokio::select! {
        biased;
        _ = cancel.cancelled() => return ToolPhaseOutcome::Canceled,
        outcomes = execute_tool_calls(registry, session_id, tool_calls, timeout, emitter) => outcomes,
    };
    ToolPhaseOutcome::Completed(
        outcomes
            .into_iter()
            .map(ToolExecutionOutcome::into_message)
            .collect(),
    )
}
