//! Client-facing stream events and their SSE encoding.
//!
//! The agent loop reports a detailed [`AgentEvent`] trace; clients only see a
//! narrow set of [`StreamEvent`]s derived from it.

mod sink;

pub use sink::StreamSink;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::agent_loop::AgentEvent;
use crate::tools::ToolKind;

/// One frame of the outbound stream.
///
/// Per request: `Checkpoint` (new sessions only) first, then `Content` and
/// `SearchResults` in the order they happened, then exactly one `End`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Checkpoint { checkpoint_id: String },
    Content { content: String },
    SearchResults { urls: Vec<String> },
    End,
}

impl StreamEvent {
    /// Encode as one SSE frame: `data: <json>\n\n`.
    pub fn to_sse_frame(&self) -> Bytes {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize stream event");
                r#"{"type":"end"}"#.to_string()
            }
        };
        Bytes::from(format!("data: {json}\n\n"))
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }
}

/// Map an agent event onto the client stream, if it has a client-facing form.
///
/// Only assistant text and successful search-kind tool results are forwarded;
/// everything else stays internal.
pub fn translate(event: &AgentEvent) -> Option<StreamEvent> {
    match event {
        AgentEvent::AssistantDelta { text } if !text.is_empty() => Some(StreamEvent::Content {
            content: text.clone(),
        }),
        AgentEvent::ToolExecutionEnd {
            kind: ToolKind::Search,
            result,
            ..
        } if !result.is_error => Some(StreamEvent::SearchResults {
            urls: extract_urls(&result.result),
        }),
        _ => None,
    }
}

/// URLs of a search payload, in result order.
///
/// Accepts a bare array of items or an object with a `results` array; keeps
/// only object items carrying a string `url`.
pub fn extract_urls(payload: &serde_json::Value) -> Vec<String> {
    let items = match payload {
        serde_json::Value::Array(items) => items.as_slice(),
        serde_json::Value::Object(obj) => match obj.get("results") {
            Some(serde_json::Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };
    items
        .iter()
        .filter_map(|item| item.get("url").and_then(|u| u.as_str()))
        .map(str::to_string)
        .collect()
}
