use super::*;

use crate::agent_loop::events::AgentEvent;
use crate::agent_loop::types::RunStatus;
use crate::types::ModelMessage;

mod support;


fn tool_result_ids(history: &[ModelMessage]) -> Vec<String> {
    history
        .iter()
        .filter_map(|m| match m {
            ModelMessage::ToolResult { result, .. } => Some(result.tool_call_id.clone()),
            _ => None,
        })
        .collect()
}

fn roles(history: &[ModelMessage]) -> Vec<crate::types::Role> {
    history.iter().map(ModelMessage::role).collect()
}
