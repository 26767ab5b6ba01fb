//! OpenAI-compatible Chat Completions streaming provider.

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tracing::debug;

use crate::error::ScoutError;
use crate::types::*;

use super::http::{bearer_headers, parse_sse_data, response_error, shared_client};
use super::{DeltaStream, ModelProvider, ProviderRequest};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    name: String,
    model: String,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(model: impl Into<String>, api_key: String, base_url: Option<String>) -> Self {
        Self {
            name: "openai".to_string(),
            model: model.into(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    /// Rename the provider for logs (OpenAI-compatible hosts).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub(crate) fn build_request_body(&self, request: &ProviderRequest) -> serde_json::Value {
        let messages = request
            .messages
            .iter()
            .map(message_to_openai)
            .collect::<Vec<_>>();

        let mut body = serde_json::Map::new();
        body.insert("model".into(), self.model.clone().into());
        body.insert("messages".into(), messages.into());
        body.insert("stream".into(), true.into());

        if let Some(max) = request.settings.max_tokens {
            body.insert("max_tokens".into(), max.into());
        }
        if let Some(temp) = request.settings.temperature {
            body.insert("temperature".into(), temp.into());
        }
        if let Some(top_p) = request.settings.top_p {
            body.insert("top_p".into(), top_p.into());
        }
        if let Some(ref stops) = request.settings.stop_sequences {
            body.insert("stop".into(), serde_json::json!(stops));
        }
        if let Some(seed) = request.settings.seed {
            body.insert("seed".into(), seed.into());
        }

        if let Some(ref tools) = request.tools {
            if !tools.is_empty() {
                let tool_defs: Vec<serde_json::Value> = tools
                    .iter()
                    .map(|t| {
                        serde_json::json!({
                            "type": "function",
                            "function": {
                                "name": t.name,
                                "description": t.description,
                                "parameters": t.parameters,
                            }
                        })
                    })
                    .collect();
                body.insert("tools".into(), tool_defs.into());
            }
        }

        serde_json::Value::Object(body)
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        &self.name
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn stream_text(&self, request: &ProviderRequest) -> Result<DeltaStream, ScoutError> {
        let body = self.build_request_body(request);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            provider = %self.name,
            model = %self.model,
            messages = request.messages.len(),
            "stream_text"
        );

        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(response_error(resp).await);
        }

        let byte_stream = resp.bytes_stream();

        let stream = async_stream::stream! {
            let mut buffer: Vec<u8> = Vec::new();
            let mut parser = ChatStreamParser::default();
            futures::pin_mut!(byte_stream);

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(ScoutError::Network(e));
                        return;
                    }
                };
                buffer.extend_from_slice(&chunk);

                while let Some(line_end) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=line_end).collect();
                    let line = String::from_utf8_lossy(&line);
                    for item in parser.push_line(line.trim()) {
                        let failed = item.is_err();
                        yield item;
                        if failed {
                            return;
                        }
                    }
                }
            }

            if !buffer.is_empty() {
                let line = String::from_utf8_lossy(&buffer).to_string();
                for item in parser.push_line(line.trim()) {
                    yield item;
                }
            }
            for item in parser.finish() {
                yield Ok(item);
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Incremental parser for chat-completions SSE lines.
///
/// Tool-call fragments are accumulated per index and flushed as complete
/// calls when the choice reports a finish reason (or the stream ends).
#[derive(Default)]
pub(crate) struct ChatStreamParser {
    partial_calls: BTreeMap<usize, PartialToolCall>,
    usage: Option<Usage>,
    finished: bool,
}

#[derive(Default)]
struct PartialToolCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

impl ChatStreamParser {
    pub(crate) fn push_line(&mut self, line: &str) -> Vec<Result<TextStreamDelta, ScoutError>> {
        if self.finished || line.is_empty() || line.starts_with(':') {
            return Vec::new();
        }
        let Some(data) = parse_sse_data(line) else {
            return Vec::new();
        };

        let chunk = match serde_json::from_str::<OpenAiStreamChunk>(data) {
            Ok(chunk) => chunk,
            Err(_) => {
                if let Ok(value) = serde_json::from_str::<serde_json::Value>(data) {
                    if let Some(error) = value.get("error") {
                        let message = error
                            .get("message")
                            .and_then(|m| m.as_str())
                            .map(String::from)
                            .unwrap_or_else(|| error.to_string());
                        return vec![Err(ScoutError::Stream(message))];
                    }
                }
                debug!(data, "skipping unparseable stream chunk");
                return Vec::new();
            }
        };

        if let Some(usage) = chunk
            .usage
            .or_else(|| chunk.x_groq.and_then(|extra| extra.usage))
        {
            self.usage = Some(usage.into());
        }

        let mut out = Vec::new();
        let Some(choice) = chunk.choices.into_iter().next() else {
            return out;
        };

        if let Some(text) = choice.delta.content {
            if !text.is_empty() {
                out.push(Ok(TextStreamDelta::text(text)));
            }
        }

        for fragment in choice.delta.tool_calls.unwrap_or_default() {
            let partial = self.partial_calls.entry(fragment.index).or_default();
            if let Some(id) = fragment.id.filter(|id| !id.is_empty()) {
                partial.id = Some(id);
            }
            if let Some(function) = fragment.function {
                if let Some(name) = function.name {
                    partial.name.push_str(&name);
                }
                if let Some(arguments) = function.arguments {
                    partial.arguments.push_str(&arguments);
                }
            }
        }

        if let Some(reason) = choice.finish_reason {
            out.extend(self.flush(parse_finish_reason(&reason)).into_iter().map(Ok));
        }
        out
    }

    /// Flush anything still pending when the byte stream ends.
    pub(crate) fn finish(&mut self) -> Vec<TextStreamDelta> {
        if self.finished {
            return Vec::new();
        }
        let reason = if self.partial_calls.is_empty() {
            FinishReason::Stop
        } else {
            FinishReason::ToolCalls
        };
        self.flush(Some(reason))
    }

    fn flush(&mut self, finish_reason: Option<FinishReason>) -> Vec<TextStreamDelta> {
        self.finished = true;
        let mut out: Vec<TextStreamDelta> = std::mem::take(&mut self.partial_calls)
            .into_iter()
            .filter(|(_, partial)| !partial.name.is_empty())
            .map(|(index, partial)| {
                TextStreamDelta::tool_call(AgentToolCall {
                    id: partial.id.unwrap_or_else(|| format!("call_{index}")),
                    name: partial.name,
                    arguments: parse_arguments(&partial.arguments),
                })
            })
            .collect();
        out.push(TextStreamDelta::done(finish_reason, self.usage.take()));
        out
    }
}

fn parse_arguments(raw: &str) -> serde_json::Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return serde_json::json!({});
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

fn parse_finish_reason(s: &str) -> Option<FinishReason> {
    match s {
        "stop" => Some(FinishReason::Stop),
        "length" => Some(FinishReason::Length),
        "tool_calls" | "function_call" => Some(FinishReason::ToolCalls),
        "content_filter" => Some(FinishReason::ContentFilter),
        _ => None,
    }
}

fn message_to_openai(msg: &ModelMessage) -> serde_json::Value {
    match msg {
        ModelMessage::System { text } => serde_json::json!({ "role": "system", "content": text }),
        ModelMessage::User { text, .. } => serde_json::json!({ "role": "user", "content": text }),
        ModelMessage::Assistant {
            text, tool_calls, ..
        } => {
            if tool_calls.is_empty() {
                return serde_json::json!({ "role": "assistant", "content": text });
            }
            let tc_json: Vec<serde_json::Value> = tool_calls
                .iter()
                .map(|tc| {
                    serde_json::json!({
                        "id": tc.id,
                        "type": "function",
                        "function": {
                            "name": tc.name,
                            "arguments": tc.arguments.to_string(),
                        }
                    })
                })
                .collect();
            serde_json::json!({
                "role": "assistant",
                "content": if text.is_empty() { serde_json::Value::Null } else { serde_json::Value::String(text.clone()) },
                "tool_calls": tc_json,
            })
        }
        ModelMessage::ToolResult {
            result, tool_name, ..
        } => serde_json::json!({
            "role": "tool",
            "tool_call_id": result.tool_call_id,
            "name": tool_name,
            "content": result.result.to_string(),
        }),
    }
}

// Wire types (internal)

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl From<OpenAiUsage> for Usage {
    fn from(u: OpenAiUsage) -> Self {
        Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }
    }
}

#[derive(Deserialize)]
struct OpenAiStreamChunk {
    choices: Vec<OpenAiStreamChoice>,
    usage: Option<OpenAiUsage>,
    /// Groq reports usage here on the final chunk.
    x_groq: Option<GroqExtra>,
}

#[derive(Deserialize)]
struct GroqExtra {
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiStreamChoice {
    delta: OpenAiStreamDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiStreamDelta {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiToolCallFragment>>,
}

#[derive(Deserialize)]
struct OpenAiToolCallFragment {
    index: usize,
    id: Option<String>,
    function: Option<OpenAiFunctionFragment>,
}

#[derive(Deserialize)]
struct OpenAiFunctionFragment {
    name: Option<String>,
    arguments: Option<String>,
}
