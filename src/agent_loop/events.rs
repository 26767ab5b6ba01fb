//! Agent loop execution events.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::tools::ToolKind;
use crate::types::AgentToolResult;

use super::types::{RunId, RunStatus};

/// Callback receiving agent events in the order they happen.
pub type AgentEventSink = Arc<dyn Fn(AgentEvent) + Send + Sync>;

/// Step-level trace of one run.
///
/// Within a run, `AgentStart` comes first and `AgentEnd` last. Text deltas of
/// one model step arrive in generation order; `ToolExecutionEnd` events arrive
/// in completion order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    AgentStart {
        run_id: RunId,
        session_id: String,
    },
    /// A model invocation is about to start.
    TurnStart {
        run_id: RunId,
        iteration: usize,
    },
    /// Incremental assistant text. Never empty.
    AssistantDelta {
        text: String,
    },
    ToolExecutionStart {
        tool_call_id: String,
        tool_name: String,
        args: serde_json::Value,
    },
    ToolExecutionEnd {
        tool_call_id: String,
        tool_name: String,
        kind: ToolKind,
        result: AgentToolResult,
    },
    /// The model asked for a tool that is not registered.
    ToolCallSkipped {
        tool_call_id: String,
        tool_name: String,
    },
    Error {
        error: String,
    },
    AgentEnd {
        run_id: RunId,
        status: RunStatus,
    },
}
