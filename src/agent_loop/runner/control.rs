use serde::{Deserialize, Serialize};

use super::super::events::{AgentEvent, AgentEventSink};
use crate::types::ModelMessage;

/// States of the model/tool loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    AwaitingModel,
    ExecutingTools,
    Terminal,
}

/// Transition taken after `message` was produced.
///
/// An assistant message carrying tool calls leads to tool execution, any other
/// assistant message ends the turn, and user or tool-result messages hand
/// control back to the model.
pub fn route(message: &ModelMessage) -> LoopState {
    match message {
        ModelMessage::Assistant { tool_calls, .. } if !tool_calls.is_empty() => {
            LoopState::ExecutingTools
        }
        ModelMessage::Assistant { .. } => LoopState::Terminal,
        ModelMessage::User { .. } | ModelMessage::ToolResult { .. } | ModelMessage::System { .. } => {
            LoopState::AwaitingModel
        }
    }
}

#[derive(Clone)]
pub(super) struct AgentEventEmitter {
    sink: Option<AgentEventSink>,
}

impl AgentEventEmitter {
    pub(super) fn new(sink: Option<AgentEventSink>) -> Self {
        Self { sink }
    }

    pub(super) fn emit(&self, event: AgentEvent) {
        if let Some(sink) = &self.sink {
            (sink)(event);
        }
    }
}
