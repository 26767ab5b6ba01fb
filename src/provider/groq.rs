//! Groq provider (OpenAI-compatible).

use async_trait::async_trait;

use crate::error::ScoutError;

use super::openai::OpenAiProvider;
use super::{DeltaStream, ModelProvider, ProviderRequest};

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

pub struct GroqProvider {
    inner: OpenAiProvider,
}

impl GroqProvider {
    /// `base_url` overrides the Groq endpoint (proxies, tests).
    pub fn new(model: impl Into<String>, api_key: String, base_url: Option<String>) -> Self {
        Self {
            inner: OpenAiProvider::new(
                model,
                api_key,
                Some(base_url.unwrap_or_else(|| GROQ_BASE_URL.to_string())),
            )
            .with_name("groq"),
        }
    }
}

#[async_trait]
impl ModelProvider for GroqProvider {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    async fn stream_text(&self, request: &ProviderRequest) -> Result<DeltaStream, ScoutError> {
        self.inner.stream_text(request).await
    }
}
