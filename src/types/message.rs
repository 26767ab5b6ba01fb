//! Message types for model communication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message in a conversation.
///
/// History is append-only: tool results always follow the assistant message
/// whose tool calls they answer, as one contiguous block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ModelMessage {
    /// Instructions prepended at request time. Never persisted in a session.
    System { text: String },
    User {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },
    Assistant {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<AgentToolCall>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },
    ToolResult {
        #[serde(flatten)]
        result: AgentToolResult,
        tool_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },
}

impl ModelMessage {
    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::System { text: text.into() }
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::User {
            text: text.into(),
            timestamp: Some(Utc::now()),
        }
    }

    /// Create an assistant message without tool calls.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::assistant_with_tools(text, Vec::new())
    }

    /// Create an assistant message carrying tool calls.
    pub fn assistant_with_tools(text: impl Into<String>, tool_calls: Vec<AgentToolCall>) -> Self {
        Self::Assistant {
            text: text.into(),
            tool_calls,
            timestamp: Some(Utc::now()),
        }
    }

    /// Create a tool result message answering `result.tool_call_id`.
    pub fn tool_result(tool_name: impl Into<String>, result: AgentToolResult) -> Self {
        Self::ToolResult {
            result,
            tool_name: tool_name.into(),
            timestamp: Some(Utc::now()),
        }
    }

    /// Text content of the message (payload JSON for tool results).
    pub fn text(&self) -> String {
        match self {
            Self::System { text } | Self::User { text, .. } | Self::Assistant { text, .. } => {
                text.clone()
            }
            Self::ToolResult { result, .. } => result.result.to_string(),
        }
    }

    /// Tool calls requested by this message. Empty for non-assistant messages.
    pub fn tool_calls(&self) -> &[AgentToolCall] {
        match self {
            Self::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::System { .. } => Role::System,
            Self::User { .. } => Role::User,
            Self::Assistant { .. } => Role::Assistant,
            Self::ToolResult { .. } => Role::Tool,
        }
    }
}

/// Conversation role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// A tool execution result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentToolResult {
    pub tool_call_id: String,
    pub result: serde_json::Value,
    #[serde(default)]
    pub is_error: bool,
}

impl AgentToolResult {
    pub fn success(tool_call_id: impl Into<String>, result: serde_json::Value) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            result,
            is_error: false,
        }
    }

    /// Error payload handed back to the model as data.
    pub fn error(tool_call_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            result: serde_json::json!({ "error": message.into() }),
            is_error: true,
        }
    }
}
