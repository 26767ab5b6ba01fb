//! Model provider trait and shared utilities.

pub mod groq;
pub mod http;
pub mod openai;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::ScoutError;
use crate::types::{GenerationSettings, ModelMessage, TextStreamDelta};

pub use groq::GroqProvider;
pub use openai::OpenAiProvider;

/// A request sent to a model provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub messages: Vec<ModelMessage>,
    pub settings: GenerationSettings,
    /// Tool schemas the model may call. `None` disables tool calling.
    pub tools: Option<Vec<ToolDefinition>>,
}

/// Tool definition sent to the provider API.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Stream of deltas for one model response.
pub type DeltaStream = BoxStream<'static, Result<TextStreamDelta, ScoutError>>;

/// Core trait implemented by all model providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "groq").
    fn provider_name(&self) -> &str;

    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Generate a response token by token.
    ///
    /// Text arrives as `TextDelta`s in generation order; each requested tool
    /// call arrives once, fully assembled, as a `ToolCallDelta`; the stream
    /// finishes with `Done`.
    async fn stream_text(&self, request: &ProviderRequest) -> Result<DeltaStream, ScoutError>;
}
