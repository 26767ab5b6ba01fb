//! Request-level chat service.
//!
//! One call to [`ChatService::stream_chat`] spawns one task that drives a
//! single turn and writes its [`StreamEvent`]s, in order, to one subscriber.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::agent_loop::{AgentEventSink, LoopRunner, RunRequest, RunStatus, Runner};
use crate::config::ScoutConfig;
use crate::error::ScoutError;
use crate::provider::GroqProvider;
use crate::store::InMemoryStore;
use crate::stream::{translate, StreamEvent, StreamSink};
use crate::tools::{TavilySearchTool, ToolRegistry};

/// Ordered events of one chat request. Ends after `End`.
pub type ChatStream = UnboundedReceiverStream<StreamEvent>;

/// Entry point shared by the HTTP handler and the CLI.
#[derive(Clone)]
pub struct ChatService {
    runner: Arc<dyn Runner>,
}

impl ChatService {
    pub fn new(runner: Arc<dyn Runner>) -> Self {
        Self { runner }
    }

    /// Wire the Groq model, the web-search tool and an in-memory store.
    pub fn from_config(config: &ScoutConfig) -> Result<Self, ScoutError> {
        let api_key = config
            .groq_api_key
            .clone()
            .ok_or_else(|| ScoutError::Configuration("GROQ_API_KEY is missing".to_string()))?;
        let provider = Arc::new(GroqProvider::new(
            config.model.clone(),
            api_key,
            Some(config.base_url.clone()),
        ));
        if config.tavily_api_key.is_none() {
            warn!("TAVILY_API_KEY is not set; web search calls will fail");
        }
        let search = TavilySearchTool::new_with_base_url(
            config.tavily_api_key.clone().unwrap_or_default(),
            config.search_max_results,
            config.tavily_base_url.clone(),
        );
        let registry = Arc::new(ToolRegistry::new().with_tool(Arc::new(search)));
        let store = Arc::new(InMemoryStore::new());
        let runner = LoopRunner::from_config(config, provider, registry, store);
        Ok(Self::new(Arc::new(runner)))
    }

    /// Run one turn for `message` and stream its events.
    ///
    /// A missing or blank `checkpoint_id` starts a new session and the stream
    /// opens with its `Checkpoint`. The stream always closes with one `End`.
    /// Dropping the stream cancels the turn.
    pub fn stream_chat(
        &self,
        message: impl Into<String>,
        checkpoint_id: Option<String>,
    ) -> ChatStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Arc::new(StreamSink::new(tx));
        tokio::spawn(drive(
            self.runner.clone(),
            message.into(),
            checkpoint_id,
            sink,
        ));
        UnboundedReceiverStream::new(rx)
    }
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService").finish_non_exhaustive()
    }
}

async fn drive(
    runner: Arc<dyn Runner>,
    message: String,
    checkpoint_id: Option<String>,
    sink: Arc<StreamSink>,
) {
    let session_id = match checkpoint_id.filter(|id| !id.trim().is_empty()) {
        Some(id) => id,
        None => {
            let id = Uuid::new_v4().to_string();
            sink.send(StreamEvent::Checkpoint {
                checkpoint_id: id.clone(),
            });
            id
        }
    };

    let translator = sink.clone();
    let event_sink: AgentEventSink = Arc::new(move |event| {
        if let Some(stream_event) = translate(&event) {
            translator.send(stream_event);
        }
    });

    let request = RunRequest::new(session_id.clone(), message).with_event_sink(event_sink);
    let run_id = request.run_id;
    info!(%run_id, session_id = %session_id, "chat request started");

    match runner.start(request).await {
        Ok(handle) => {
            let cancel = handle.cancel_token();
            let wait = handle.wait();
            tokio::pin!(wait);
            let result = tokio::select! {
                result = &mut wait => result,
                _ = sink.closed() => {
                    debug!(%run_id, "subscriber disconnected; canceling run");
                    cancel.cancel();
                    wait.await
                }
            };
            match result.status {
                RunStatus::Completed => {
                    info!(%run_id, iterations = result.iterations, "chat request finished")
                }
                status => warn!(
                    %run_id,
                    %status,
                    error = result.error.as_deref().unwrap_or_default(),
                    "chat request ended early"
                ),
            }
        }
        Err(e) => warn!(%run_id, error = %e, "failed to start run"),
    }

    sink.end();
}
