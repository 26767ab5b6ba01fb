use super::*;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::agent_loop::events::AgentEvent;
use crate::provider::{DeltaStream, ProviderRequest};
use crate::store::InMemoryStore;
use crate::tools::{AgentTool, AgentToolParameters, Tool, ToolKind};
use crate::types::{AgentToolCall, FinishReason, TextStreamDelta, Usage};

/// One scripted model response.
#[derive(Clone)]
pub(super) enum Step {
    Text(Vec<&'static str>),
    ToolCalls(Vec<AgentToolCall>),
    Fail(&'static str),
    TextThenError(&'static str, &'static str),
    TextThenHang(&'static str),
}

/// Provider replaying `steps` in order. The last step repeats once the
/// script is exhausted.
pub(super) struct ScriptedProvider {
    steps: Vec<Step>,
    calls: AtomicUsize,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
}

impl ScriptedProvider {
    pub(super) fn new(steps: Vec<Step>) -> (Arc<Self>, Arc<Mutex<Vec<ProviderRequest>>>) {
        let requests = Arc::new(Mutex::new(Vec::new()));
        (
            Arc::new(Self {
                steps,
                calls: AtomicUsize::new(0),
                requests: requests.clone(),
            }),
            requests,
        )
    }
}

fn done(reason: FinishReason) -> Result<TextStreamDelta, ScoutError> {
    Ok(TextStreamDelta::done(
        Some(reason),
        Some(Usage {
            input_tokens: 10,
            output_tokens: 5,
            total_tokens: 15,
        }),
    ))
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted-model"
    }

    async fn stream_text(&self, request: &ProviderRequest) -> Result<DeltaStream, ScoutError> {
        self.requests
            .lock()
            .expect("request lock")
            .push(request.clone());
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .get(index)
            .or_else(|| self.steps.last())
            .cloned()
            .expect("script has at least one step");

        let stream: DeltaStream = match step {
            Step::Text(chunks) => {
                let mut events: Vec<_> = chunks
                    .into_iter()
                    .map(|c| Ok(TextStreamDelta::text(c)))
                    .collect();
                events.push(done(FinishReason::Stop));
                stream::iter(events).boxed()
            }
            Step::ToolCalls(calls) => {
                let mut events: Vec<_> = calls
                    .into_iter()
                    .map(|c| Ok(TextStreamDelta::tool_call(c)))
                    .collect();
                events.push(done(FinishReason::ToolCalls));
                stream::iter(events).boxed()
            }
            Step::Fail(message) => return Err(ScoutError::api(500, message)),
            Step::TextThenError(text, error) => stream::iter(vec![
                Ok(TextStreamDelta::text(text)),
                Ok(TextStreamDelta::error(error)),
            ])
            .boxed(),
            Step::TextThenHang(text) => stream::iter(vec![Ok(TextStreamDelta::text(text))])
                .chain(stream::pending())
                .boxed(),
        };
        Ok(stream)
    }
}

pub(super) fn call(id: &str, name: &str, arguments: serde_json::Value) -> AgentToolCall {
    AgentToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments,
    }
}

/// Search-kind tool returning fixed results.
pub(super) fn search_tool(results: serde_json::Value) -> Arc<dyn Tool> {
    Arc::new(
        AgentTool::new(
            "search",
            "Web search",
            AgentToolParameters::object()
                .string("query", "query", true)
                .build(),
            move |_args, _ctx| {
                let results = results.clone();
                async move { Ok(results) }
            },
        )
        .with_kind(ToolKind::Search),
    )
}

/// Tool sleeping for `delay_ms` from its arguments, tracking peak concurrency.
pub(super) fn sleepy_tool(name: &str, peak: Arc<AtomicUsize>) -> Arc<dyn Tool> {
    let active = Arc::new(AtomicUsize::new(0));
    Arc::new(AgentTool::new(
        name,
        "Sleeps",
        AgentToolParameters::object()
            .integer("delay_ms", "delay", true)
            .build(),
        move |args, ctx| {
            let active = active.clone();
            let peak = peak.clone();
            async move {
                let delay = args.get_u64_opt("delay_ms").unwrap_or(0);
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                Ok(serde_json::json!({ "slept_ms": delay, "call": ctx.tool_call_id }))
            }
        },
    ))
}

pub(super) fn failing_tool(name: &str) -> Arc<dyn Tool> {
    let tool_name = name.to_string();
    Arc::new(AgentTool::new(
        name,
        "Always fails",
        AgentToolParameters::empty(),
        move |_args, _ctx| {
            let tool_name = tool_name.clone();
            async move { Err(ScoutError::tool(tool_name, "upstream unavailable")) }
        },
    ))
}

pub(super) fn capture_events() -> (AgentEventSink, Arc<Mutex<Vec<AgentEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink_events = events.clone();
    let sink: AgentEventSink = Arc::new(move |event| {
        sink_events.lock().expect("event lock").push(event);
    });
    (sink, events)
}

pub(super) fn test_runner(
    steps: Vec<Step>,
    tools: Vec<Arc<dyn Tool>>,
) -> (
    LoopRunner,
    Arc<InMemoryStore>,
    Arc<Mutex<Vec<ProviderRequest>>>,
) {
    let (provider, requests) = ScriptedProvider::new(steps);
    let registry = tools
        .into_iter()
        .fold(ToolRegistry::new(), |registry, tool| registry.with_tool(tool));
    let store = Arc::new(InMemoryStore::new());
    let runner = LoopRunner::new(provider, Arc::new(registry), store.clone());
    (runner, store, requests)
}

pub(super) async fn run_to_end(runner: &LoopRunner, request: RunRequest) -> RunResult {
    let handle = runner.start(request).await.expect("start run");
    tokio::time::timeout(Duration::from_secs(30), handle.wait())
        .await
        .expect("run wait timeout")
}
