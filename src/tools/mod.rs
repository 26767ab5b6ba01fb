//! Tool system for function calling.

pub mod arguments;
pub mod registry;
pub mod search;
pub mod tool;
pub mod types;
pub mod validation;

pub use arguments::ToolArguments;
pub use registry::ToolRegistry;
pub use search::{SearchResult, TavilySearchTool, SEARCH_TOOL_NAME};
pub use tool::{AgentTool, Tool, ToolExecutionContext, ToolKind};
pub use types::AgentToolParameters;
