//! Tavily web search tool.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext, ToolKind};
use super::types::AgentToolParameters;
use crate::error::ScoutError;
use crate::provider::http::{bearer_headers, response_error, shared_client};
use crate::util::retry::RetryPolicy;

pub const SEARCH_TOOL_NAME: &str = "tavily_search_results_json";
const TAVILY_BASE_URL: &str = "https://api.tavily.com";
const DESCRIPTION: &str = "A search engine optimized for comprehensive, accurate, and trusted \
results. Useful for when you need to answer questions about current events. Input should be a \
search query.";

/// One search hit as handed back to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchArgs {
    query: String,
}

/// Web search backed by the Tavily API.
///
/// Output is a JSON array of `{title, url, content, score}` objects. Any
/// field may be absent.
pub struct TavilySearchTool {
    api_key: String,
    base_url: String,
    max_results: usize,
    parameters: AgentToolParameters,
    retry_policy: RetryPolicy,
}

impl TavilySearchTool {
    pub fn new(api_key: String, max_results: usize) -> Self {
        Self::new_with_base_url(api_key, max_results, TAVILY_BASE_URL.to_string())
    }

    pub fn new_with_base_url(api_key: String, max_results: usize, base_url: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_results: max_results.max(1),
            parameters: AgentToolParameters::object()
                .string("query", "search query to look up", true)
                .build(),
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    async fn search_once(&self, query: &str) -> Result<Vec<SearchResult>, ScoutError> {
        let body = serde_json::json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": self.max_results,
            "search_depth": "advanced",
        });
        let resp = shared_client()
            .post(format!("{}/search", self.base_url))
            .headers(bearer_headers(&self.api_key))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(response_error(resp).await);
        }

        let parsed: TavilyResponse = resp.json().await?;
        Ok(parsed.results)
    }
}

#[async_trait]
impl Tool for TavilySearchTool {
    fn name(&self) -> &str {
        SEARCH_TOOL_NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Search
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, ScoutError> {
        let SearchArgs { query } = args.deserialize()?;
        if query.trim().is_empty() {
            return Err(ScoutError::InvalidArgument("query must not be empty".into()));
        }
        if self.api_key.is_empty() {
            return Err(ScoutError::Configuration("TAVILY_API_KEY is missing".into()));
        }
        debug!(tool_call_id = %ctx.tool_call_id, %query, "tavily search");

        let results = self
            .retry_policy
            .execute(|| self.search_once(&query))
            .await
            .map_err(|e| ScoutError::tool(SEARCH_TOOL_NAME, e.to_string()))?;

        Ok(serde_json::to_value(results)?)
    }
}

impl std::fmt::Debug for TavilySearchTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TavilySearchTool")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("max_results", &self.max_results)
            .finish()
    }
}
