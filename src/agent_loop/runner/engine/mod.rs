use async_trait::async_trait;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::ScoutError;
use crate::provider::ProviderRequest;
use crate::types::{ModelMessage, Usage};

use super::control::{route, AgentEventEmitter, LoopState};
use super::super::events::AgentEvent;
use super::super::types::RunStatus;
use super::{LoopRunner, RunHandle, RunRequest, RunResult, Runner};

mod llm_phase;
mod tool_phase;

use llm_phase::{run_llm_phase, LlmPhaseArgs, LlmPhaseOutcome};
use tool_phase::{run_tool_phase, ToolPhaseOutcome};

#[derive(Default)]
struct Progress {
    iterations: usize,
    usage: Usage,
}

#[async_trait]
impl Runner for LoopRunner {
    async fn start(&self, request: RunRequest) -> Result<RunHandle, ScoutError> {
        let (handle, result_tx) = RunHandle::new(request.run_id);
        let cancel = handle.cancel_token();
        let runner = self.clone();

        tokio::spawn(async move {
            let result = runner.drive(request, cancel).await;
            let _ = result_tx.send(result);
        });

        Ok(handle)
    }
}

impl LoopRunner {
    async fn drive(&self, request: RunRequest, cancel: CancellationToken) -> RunResult {
        let emitter = AgentEventEmitter::new(request.event_sink.clone());
        info!(run_id = %request.run_id, session_id = %request.session_id, "run start");
        emitter.emit(AgentEvent::AgentStart {
            run_id: request.run_id,
            session_id: request.session_id.clone(),
        });

        let mut progress = Progress::default();
        let result = self
            .run_turn(&request, &emitter, &cancel, &mut progress)
            .await
            .with_progress(progress.iterations, progress.usage);

        if let Some(error) = &result.error {
            if result.status == RunStatus::Failed {
                warn!(run_id = %request.run_id, %error, "run failed");
                emitter.emit(AgentEvent::Error {
                    error: error.clone(),
                });
            }
        }
        emitter.emit(AgentEvent::AgentEnd {
            run_id: request.run_id,
            status: result.status,
        });
        info!(
            run_id = %request.run_id,
            status = %result.status,
            iterations = result.iterations,
            total_tokens = result.usage.total_tokens,
            "run finished"
        );
        result
    }

    async fn run_turn(
        &self,
        request: &RunRequest,
        emitter: &AgentEventEmitter,
        cancel: &CancellationToken,
        progress: &mut Progress,
    ) -> RunResult {
        let session_id = request.session_id.as_str();
        let _turn_guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => return RunResult::canceled(),
            guard = self.locks.lock(session_id) => guard,
        };

        let mut history = match self
            .store_retry
            .execute(|| self.store.get_history(session_id))
            .await
        {
            Ok(history) => history,
            Err(err) => return RunResult::failed(err.to_string()),
        };

        let user = ModelMessage::user(request.message.clone());
        if let Err(err) = self.append_block(session_id, vec![user.clone()]).await {
            return RunResult::failed(err.to_string());
        }
        let mut state = route(&user);
        history.push(user);

        let tool_defs = (!self.registry.is_empty()).then(|| self.registry.definitions());
        let idle_timeout = self
            .settings
            .stream_idle_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);
        let mut pending_assistant: Option<ModelMessage> = None;

        loop {
            match state {
                LoopState::AwaitingModel => {
                    if cancel.is_cancelled() {
                        return RunResult::canceled();
                    }
                    if progress.iterations >= self.limits.max_iterations {
                        warn!(
                            run_id = %request.run_id,
                            max_iterations = self.limits.max_iterations,
                            "iteration limit reached"
                        );
                        return RunResult::iteration_limit(self.limits.max_iterations);
                    }
                    progress.iterations += 1;
                    emitter.emit(AgentEvent::TurnStart {
                        run_id: request.run_id,
                        iteration: progress.iterations,
                    });

                    let provider_request = ProviderRequest {
                        messages: self.model_context(&history),
                        settings: self.settings.clone(),
                        tools: tool_defs.clone(),
                    };
                    let outcome = run_llm_phase(LlmPhaseArgs {
                        provider: self.provider.as_ref(),
                        request: &provider_request,
                        emitter,
                        cancel,
                        idle_timeout,
                    })
                    .await;

                    let assistant = match outcome {
                        LlmPhaseOutcome::Ready {
                            text,
                            tool_calls,
                            usage,
                        } => {
                            if let Some(usage) = usage {
                                progress.usage.merge(&usage);
                            }
                            ModelMessage::assistant_with_tools(text, tool_calls)
                        }
                        LlmPhaseOutcome::Canceled => return RunResult::canceled(),
                        LlmPhaseOutcome::Failed(err) => return RunResult::failed(err.to_string()),
                    };

                    state = route(&assistant);
                    if state == LoopState::Terminal {
                        if let Err(err) = self.append_block(session_id, vec![assistant.clone()]).await
                        {
                            return RunResult::failed(err.to_string());
                        }
                        history.push(assistant);
                    } else {
                        pending_assistant = Some(assistant);
                    }
                }
                LoopState::ExecutingTools => {
                    let Some(assistant) = pending_assistant.take() else {
                        return RunResult::failed("tool phase entered without tool calls");
                    };
                    if cancel.is_cancelled() {
                        return RunResult::canceled();
                    }

                    let results = match run_tool_phase(
                        &self.registry,
                        session_id,
                        assistant.tool_calls(),
                        self.limits.tool_timeout,
                        emitter,
                        cancel,
                    )
                    .await
                    {
                        ToolPhaseOutcome::Completed(results) => results,
                        ToolPhaseOutcome::Canceled => return RunResult::canceled(),
                    };

                    let mut block = Vec::with_capacity(results.len() + 1);
                    block.push(assistant);
                    block.extend(results);
                    state = block.last().map(route).unwrap_or(LoopState::AwaitingModel);
                    if let Err(err) = self.append_block(session_id, block.clone()).await {
                        return RunResult::failed(err.to_string());
                    }
                    history.extend(block);
                }
                LoopState::Terminal => return RunResult::completed(),
            }
        }
    }

    /// Messages sent to the model: optional system prompt, then history.
    fn model_context(&self, history: &[ModelMessage]) -> Vec<ModelMessage> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        if let Some(prompt) = &self.system_prompt {
            messages.push(ModelMessage::system(prompt.clone()));
        }
        messages.extend(history.iter().cloned());
        messages
    }

    async fn append_block(
        &self,
        session_id: &str,
        block: Vec<ModelMessage>,
    ) -> Result<(), ScoutError> {
        self.store_retry
            .execute(|| self.store.append(session_id, block.clone()))
            .await
    }
}
