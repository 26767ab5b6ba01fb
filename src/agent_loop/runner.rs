//! Runner interfaces for the agent loop.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::ScoutConfig;
use crate::error::ScoutError;
use crate::provider::ModelProvider;
use crate::store::{ConversationStore, SessionLocks};
use crate::tools::ToolRegistry;
use crate::types::GenerationSettings;
use crate::util::retry::RetryPolicy;

use super::events::AgentEventSink;
use super::types::{RunId, RunResult};

mod control;
mod engine;
mod limits;
mod tooling;

pub use control::{route, LoopState};
pub use limits::RunnerLimits;

/// Request payload to start a run: one user message on one session.
#[derive(Clone)]
pub struct RunRequest {
    pub run_id: RunId,
    pub session_id: String,
    pub message: String,
    pub event_sink: Option<AgentEventSink>,
}

impl RunRequest {
    pub fn new(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            session_id: session_id.into(),
            message: message.into(),
            event_sink: None,
        }
    }

    pub fn with_event_sink(mut self, sink: AgentEventSink) -> Self {
        self.event_sink = Some(sink);
        self
    }
}

impl std::fmt::Debug for RunRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunRequest")
            .field("run_id", &self.run_id)
            .field("session_id", &self.session_id)
            .field("has_event_sink", &self.event_sink.is_some())
            .finish()
    }
}

/// Handle for an in-flight run.
#[derive(Debug)]
pub struct RunHandle {
    run_id: RunId,
    cancel: CancellationToken,
    result_rx: oneshot::Receiver<RunResult>,
}

impl RunHandle {
    /// Create a run handle plus the channel a runner reports the result on.
    pub fn new(run_id: RunId) -> (Self, oneshot::Sender<RunResult>) {
        let (result_tx, result_rx) = oneshot::channel();
        (
            Self {
                run_id,
                cancel: CancellationToken::new(),
                result_rx,
            },
            result_tx,
        )
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Token observed by the run. Cancelling it is equivalent to `abort`.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request cancellation. Returns false if it was already requested.
    pub fn abort(&self) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.cancel.cancel();
        true
    }

    pub async fn wait(self) -> RunResult {
        self.result_rx
            .await
            .unwrap_or_else(|_| RunResult::canceled())
    }
}

/// Starts runs.
#[async_trait]
pub trait Runner: Send + Sync {
    async fn start(&self, request: RunRequest) -> Result<RunHandle, ScoutError>;
}

/// Default runner: drives the model/tool loop for one session turn.
#[derive(Clone)]
pub struct LoopRunner {
    provider: Arc<dyn ModelProvider>,
    registry: Arc<ToolRegistry>,
    store: Arc<dyn ConversationStore>,
    locks: Arc<SessionLocks>,
    limits: RunnerLimits,
    settings: GenerationSettings,
    system_prompt: Option<String>,
    store_retry: RetryPolicy,
}

impl LoopRunner {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        registry: Arc<ToolRegistry>,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        Self {
            provider,
            registry,
            store,
            locks: Arc::new(SessionLocks::new()),
            limits: RunnerLimits::default(),
            settings: GenerationSettings::default(),
            system_prompt: None,
            store_retry: RetryPolicy::default(),
        }
    }

    /// Runner with limits, sampling settings and system prompt taken from `config`.
    pub fn from_config(
        config: &ScoutConfig,
        provider: Arc<dyn ModelProvider>,
        registry: Arc<ToolRegistry>,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        Self::new(provider, registry, store)
            .with_limits(RunnerLimits::from_config(config))
            .with_settings(config.generation_settings())
            .with_system_prompt(config.system_prompt.clone())
    }

    pub fn with_limits(mut self, limits: RunnerLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt.filter(|p| !p.trim().is_empty());
        self
    }

    pub fn with_store_retry(mut self, policy: RetryPolicy) -> Self {
        self.store_retry = policy;
        self
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn provider(&self) -> &Arc<dyn ModelProvider> {
        &self.provider
    }
}

impl std::fmt::Debug for LoopRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopRunner")
            .field("provider", &self.provider.provider_name())
            .field("model", &self.provider.model_id())
            .field("registry", &self.registry)
            .field("limits", &self.limits)
            .finish()
    }
}

#[cfg(test)]
mod tests;
