use std::time::Duration;

use futures::future;
use tracing::{debug, warn};

use super::super::events::AgentEvent;
use super::control::AgentEventEmitter;
use crate::error::ScoutError;
use crate::tools::validation::validate_arguments;
use crate::tools::{ToolArguments, ToolExecutionContext, ToolKind, ToolRegistry};
use crate::types::{AgentToolCall, AgentToolResult, ModelMessage};
use crate::util::timeout::with_timeout;

#[derive(Debug, Clone)]
pub(super) struct ToolExecutionOutcome {
    pub(super) call: AgentToolCall,
    pub(super) result: AgentToolResult,
}

impl ToolExecutionOutcome {
    pub(super) fn into_message(self) -> ModelMessage {
        ModelMessage::tool_result(self.call.name, self.result)
    }
}

pub(super) fn unknown_tool_result(call: &AgentToolCall) -> AgentToolResult {
    AgentToolResult::error(call.id.clone(), format!("unknown tool '{}'", call.name))
}

fn emit_tool_execution_start(emitter: &AgentEventEmitter, call: &AgentToolCall) {
    emitter.emit(AgentEvent::ToolExecutionStart {
        tool_call_id: call.id.clone(),
        tool_name: call.name.clone(),
        args: call.arguments.clone(),
    });
}

fn emit_tool_execution_end(
    emitter: &AgentEventEmitter,
    call: &AgentToolCall,
    kind: ToolKind,
    result: &AgentToolResult,
) {
    emitter.emit(AgentEvent::ToolExecutionEnd {
        tool_call_id: call.id.clone(),
        tool_name: call.name.clone(),
        kind,
        result: result.clone(),
    });
}

/// Run one tool call to completion. Never fails: every problem becomes an
/// error payload for the model.
pub(super) async fn execute_tool_call(
    registry: &ToolRegistry,
    session_id: &str,
    call: &AgentToolCall,
    timeout: Duration,
    emitter: &AgentEventEmitter,
) -> ToolExecutionOutcome {
    let tool = match registry.resolve(&call.name) {
        Ok(tool) => tool,
        Err(err) => {
            warn!(tool_call_id = %call.id, error = %err, "skipping tool call");
            emitter.emit(AgentEvent::ToolCallSkipped {
                tool_call_id: call.id.clone(),
                tool_name: call.name.clone(),
            });
            return ToolExecutionOutcome {
                call: call.clone(),
                result: unknown_tool_result(call),
            };
        }
    };
    let kind = tool.kind();
    emit_tool_execution_start(emitter, call);

    let result = if let Err(validation_error) =
        validate_arguments(&call.arguments, &tool.parameters().schema)
    {
        AgentToolResult::error(
            call.id.clone(),
            format!("Argument validation failed: {validation_error}"),
        )
    } else {
        let args = ToolArguments::new(call.arguments.clone());
        let ctx = ToolExecutionContext {
            tool_call_id: call.id.clone(),
            session_id: session_id.to_string(),
        };
        match with_timeout(timeout, tool.execute(&args, &ctx)).await {
            Ok(value) => AgentToolResult::success(call.id.clone(), value),
            Err(ScoutError::Timeout(ms)) => AgentToolResult::error(
                call.id.clone(),
                format!("tool '{}' timed out after {ms}ms", call.name),
            ),
            Err(err) => AgentToolResult::error(call.id.clone(), err.to_string()),
        }
    };

    if result.is_error {
        warn!(tool_call_id = %call.id, tool = %call.name, "tool call failed");
    } else {
        debug!(tool_call_id = %call.id, tool = %call.name, "tool call finished");
    }
    emit_tool_execution_end(emitter, call, kind, &result);
    ToolExecutionOutcome {
        call: call.clone(),
        result,
    }
}

/// Run all calls concurrently. End events fire in completion order; the
/// returned outcomes keep the original call order.
pub(super) async fn execute_tool_calls(
    registry: &ToolRegistry,
    session_id: &str,
    calls: &[AgentToolCall],
    timeout: Duration,
    emitter: &AgentEventEmitter,
) -> Vec<ToolExecutionOutcome> {
    let futures = calls
        .iter()
        .map(|call| execute_tool_call(registry, session_id, call, timeout, emitter));
    future::join_all(futures).await
}
