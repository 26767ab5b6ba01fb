//! Shared test helpers and mock provider.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::Notify;

use scout::agent_loop::LoopRunner;
use scout::chat::ChatService;
use scout::error::ScoutError;
use scout::provider::{DeltaStream, ModelProvider, ProviderRequest};
use scout::store::{ConversationStore, InMemoryStore};
use scout::stream::StreamEvent;
use scout::tools::{AgentTool, AgentToolParameters, Tool, ToolKind, ToolRegistry};
use scout::types::*;

enum Scripted {
    Deltas(Vec<TextStreamDelta>),
    /// Yield the deltas, then never finish.
    Hang(Vec<TextStreamDelta>),
}

/// A mock provider that streams canned responses, one per model call.
#[derive(Default)]
pub struct MockProvider {
    responses: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl MockProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a text response streamed as the given chunks.
    pub fn queue_response(&self, chunks: &[&str]) {
        let mut deltas: Vec<TextStreamDelta> =
            chunks.iter().map(|c| TextStreamDelta::text(*c)).collect();
        deltas.push(TextStreamDelta::done(Some(FinishReason::Stop), Some(usage())));
        self.push(Scripted::Deltas(deltas));
    }

    /// Queue a response requesting the given tool calls.
    pub fn queue_tool_calls(&self, calls: &[(&str, &str, serde_json::Value)]) {
        let mut deltas: Vec<TextStreamDelta> = calls
            .iter()
            .map(|(id, name, args)| {
                TextStreamDelta::tool_call(AgentToolCall {
                    id: id.to_string(),
                    name: name.to_string(),
                    arguments: args.clone(),
                })
            })
            .collect();
        deltas.push(TextStreamDelta::done(
            Some(FinishReason::ToolCalls),
            Some(usage()),
        ));
        self.push(Scripted::Deltas(deltas));
    }

    /// Queue a response that streams `text` and then stalls.
    pub fn queue_hang(&self, text: &str) {
        self.push(Scripted::Hang(vec![TextStreamDelta::text(text)]));
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn push(&self, scripted: Scripted) {
        self.responses.lock().unwrap().push_back(scripted);
    }
}

fn usage() -> Usage {
    Usage {
        input_tokens: 10,
        output_tokens: 5,
        total_tokens: 15,
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }

    async fn stream_text(&self, request: &ProviderRequest) -> Result<DeltaStream, ScoutError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Deltas(deltas)) => {
                Ok(futures::stream::iter(deltas.into_iter().map(Ok)).boxed())
            }
            Some(Scripted::Hang(deltas)) => Ok(futures::stream::iter(deltas.into_iter().map(Ok))
                .chain(futures::stream::pending())
                .boxed()),
            None => Err(ScoutError::api(503, "no queued response")),
        }
    }
}

/// A search-kind tool named like the production one, returning `results`.
pub fn search_tool(results: serde_json::Value) -> Arc<dyn Tool> {
    Arc::new(
        AgentTool::new(
            "tavily_search_results_json",
            "Web search",
            AgentToolParameters::object()
                .string("query", "search query", true)
                .build(),
            move |_args, _ctx| {
                let results = results.clone();
                async move { Ok(results) }
            },
        )
        .with_kind(ToolKind::Search),
    )
}

/// Store whose backing resource is always unreachable.
#[derive(Default)]
pub struct UnavailableStore {
    pub calls: AtomicUsize,
}

#[async_trait]
impl ConversationStore for UnavailableStore {
    async fn get_history(&self, _session_id: &str) -> Result<Vec<ModelMessage>, ScoutError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ScoutError::TransientStore("store unreachable".into()))
    }

    async fn append(&self, _session_id: &str, _messages: Vec<ModelMessage>) -> Result<(), ScoutError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ScoutError::TransientStore("store unreachable".into()))
    }
}

/// Tool that never finishes. `started` fires once it runs and `released`
/// flips when its in-flight future is dropped.
pub struct StuckTool {
    pub started: Arc<Notify>,
    pub released: Arc<AtomicBool>,
}

struct ReleaseOnDrop(Arc<AtomicBool>);

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

pub fn stuck_tool(name: &str) -> (Arc<dyn Tool>, StuckTool) {
    let started = Arc::new(Notify::new());
    let released = Arc::new(AtomicBool::new(false));
    let handle = StuckTool {
        started: started.clone(),
        released: released.clone(),
    };
    let tool = AgentTool::new(
        name,
        "Never returns",
        AgentToolParameters::object().build(),
        move |_args, _ctx| {
            let started = started.clone();
            let released = released.clone();
            async move {
                let _guard = ReleaseOnDrop(released);
                started.notify_one();
                futures::future::pending::<()>().await;
                Ok(serde_json::Value::Null)
            }
        },
    );
    (Arc::new(tool), handle)
}

pub struct Harness {
    pub provider: Arc<MockProvider>,
    pub store: Arc<InMemoryStore>,
    pub service: ChatService,
}

pub fn harness(tools: Vec<Arc<dyn Tool>>) -> Harness {
    harness_with(tools, |runner| runner)
}

pub fn harness_with(
    tools: Vec<Arc<dyn Tool>>,
    configure: impl FnOnce(LoopRunner) -> LoopRunner,
) -> Harness {
    let provider = MockProvider::new();
    let store = Arc::new(InMemoryStore::new());
    let mut registry = ToolRegistry::new();
    for tool in tools {
        registry.register(tool);
    }
    let runner = configure(LoopRunner::new(
        provider.clone(),
        Arc::new(registry),
        store.clone(),
    ));
    Harness {
        provider,
        store,
        service: ChatService::new(Arc::new(runner)),
    }
}

/// Concatenated `content` fragments.
pub fn content_text(events: &[StreamEvent]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Content { content } => Some(content.as_str()),
            _ => None,
        })
        .collect()
}

pub fn checkpoint_id(events: &[StreamEvent]) -> Option<String> {
    events.iter().find_map(|e| match e {
        StreamEvent::Checkpoint { checkpoint_id } => Some(checkpoint_id.clone()),
        _ => None,
    })
}

/// The stream must close with exactly one `End`.
pub fn assert_single_trailing_end(events: &[StreamEvent]) {
    assert_eq!(events.last(), Some(&StreamEvent::End), "events: {events:?}");
    assert_eq!(
        events.iter().filter(|e| e.is_end()).count(),
        1,
        "events: {events:?}"
    );
}
