//! Convenience re-exports for common use.

pub use crate::agent_loop::{LoopRunner, RunRequest, RunStatus, Runner};
pub use crate::chat::ChatService;
pub use crate::config::ScoutConfig;
pub use crate::error::{Result, ScoutError};
pub use crate::provider::{GroqProvider, ModelProvider};
pub use crate::store::{ConversationStore, InMemoryStore};
pub use crate::stream::StreamEvent;
pub use crate::tools::{AgentTool, AgentToolParameters, Tool, ToolArguments, ToolRegistry};
pub use crate::types::{AgentToolCall, AgentToolResult, GenerationSettings, ModelMessage, Role};
