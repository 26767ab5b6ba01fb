use futures::StreamExt;
use tokio::time::{self, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::super::super::events::AgentEvent;
use super::super::control::AgentEventEmitter;
use crate::error::ScoutError;
use crate::provider::{DeltaStream, ModelProvider, ProviderRequest};
use crate::types::{AgentToolCall, StreamEventType, TextStreamDelta, Usage};

const MAX_RATE_LIMIT_RETRIES: usize = 2;
const MAX_RATE_LIMIT_WAIT_MS: u64 = 10_000;

pub(super) enum LlmPhaseOutcome {
    Ready {
        text: String,
        tool_calls: Vec<AgentToolCall>,
        usage: Option<Usage>,
    },
    Canceled,
    Failed(ScoutError),
}

pub(super) struct LlmPhaseArgs<'a> {
    pub(super) provider: &'a dyn ModelProvider,
    pub(super) request: &'a ProviderRequest,
    pub(super) emitter: &'a AgentEventEmitter,
    pub(super) cancel: &'a CancellationToken,
    pub(super) idle_timeout: Option<Duration>,
}

fn model_error(err: impl std::fmt::Display) -> LlmPhaseOutcome {
    LlmPhaseOutcome::Failed(ScoutError::ModelInvocation(err.to_string()))
}

async fn open_stream(
    provider: &dyn ModelProvider,
    request: &ProviderRequest,
    cancel: &CancellationToken,
) -> Result<DeltaStream, LlmPhaseOutcome> {
    let mut attempt = 0usize;
    loop {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LlmPhaseOutcome::Canceled),
            result = provider.stream_text(request) => result,
        };
        match result {
            Ok(stream) => return Ok(stream),
            Err(ScoutError::RateLimited {
                retry_after_ms: Some(wait_ms),
            }) if attempt < MAX_RATE_LIMIT_RETRIES && wait_ms <= MAX_RATE_LIMIT_WAIT_MS => {
                attempt += 1;
                warn!(wait_ms, attempt, "model rate limited, waiting");
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(LlmPhaseOutcome::Canceled),
                    _ = time::sleep(Duration::from_millis(wait_ms)) => {}
                }
            }
            Err(err) => return Err(model_error(err)),
        }
    }
}

async fn next_delta(
    stream: &mut DeltaStream,
    idle_timeout: Option<Duration>,
) -> Result<Option<Result<TextStreamDelta, ScoutError>>, ScoutError> {
    match idle_timeout {
        Some(idle) => time::timeout(idle, stream.next())
            .await
            .map_err(|_| ScoutError::ModelInvocation(format!(
                "stream idle timeout after {}ms",
                idle.as_millis()
            ))),
        None => Ok(stream.next().await),
    }
}

/// One model invocation: stream the response, forward text, collect calls.
pub(super) async fn run_llm_phase(args: LlmPhaseArgs<'_>) -> LlmPhaseOutcome {
    let LlmPhaseArgs {
        provider,
        request,
        emitter,
        cancel,
        idle_timeout,
    } = args;

    debug!(
        provider = provider.provider_name(),
        model = provider.model_id(),
        messages = request.messages.len(),
        "model step"
    );

    let mut stream = match open_stream(provider, request, cancel).await {
        Ok(stream) => stream,
        Err(outcome) => return outcome,
    };

    let mut text = String::new();
    let mut tool_calls: Vec<AgentToolCall> = Vec::new();
    let mut usage = None;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return LlmPhaseOutcome::Canceled,
            next = next_delta(&mut stream, idle_timeout) => next,
        };
        let delta = match next {
            Ok(Some(Ok(delta))) => delta,
            Ok(None) => break,
            Ok(Some(Err(err))) | Err(err) => return model_error(err),
        };

        match delta.event_type {
            StreamEventType::TextDelta => {
                if !delta.text.is_empty() {
                    text.push_str(&delta.text);
                    emitter.emit(AgentEvent::AssistantDelta { text: delta.text });
                }
            }
            StreamEventType::ToolCallDelta => match delta.tool_call {
                Some(call) if !call.id.trim().is_empty() && !call.name.trim().is_empty() => {
                    if let Some(existing) = tool_calls.iter_mut().find(|c| c.id == call.id) {
                        *existing = call;
                    } else {
                        tool_calls.push(call);
                    }
                }
                _ => warn!("ignoring tool call delta without id or name"),
            },
            StreamEventType::Done => {
                usage = delta.usage;
                break;
            }
            StreamEventType::Error => return model_error(delta.text),
        }
    }

    LlmPhaseOutcome::Ready {
        text,
        tool_calls,
        usage,
    }
}
