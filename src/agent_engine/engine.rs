use std::collections::HashSet;
use std::sync::Arc;

use tracing::Instrument;

use crate::agent_engine::loop_control::LoopController;
use crate::agent_engine::state::{AgentAction, LoopState, RunOutcome, StopReason, Tool};
use crate::agent_engine::transcript::Transcript;
use crate::config::RunConfig;
use crate::errors::PilotResult;
use crate::executor::dispatcher::{ActionExecutor, RunState, ScreenshotDump};
use crate::llm::provider::LlmProvider;
use crate::llm::tools::disabled_tools;
use crate::llm::types::{CallConfig, ChatMessage, ToolCall, ToolDef};
use crate::scenario::Scenario;

const TOOL_DISABLED: &str = "error tool_disabled";
const UNKNOWN_TOOL: &str = "error unknown_tool";

/// Drives one run: model request → tool dispatch → pruning → pacing, until
/// the model stops calling tools or the step budget is spent.
pub struct AgentEngine {
    state: LoopState,
    provider: Arc<dyn LlmProvider>,
    executor: ActionExecutor,
    loop_ctrl: LoopController,
    config: RunConfig,

    catalog: Vec<ToolDef>,
    /// Fixed for the whole run.
    disabled: HashSet<String>,
    transcript: Transcript,
    run: RunState,
    steps_dispatched: u32,
}

impl AgentEngine {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        executor: ActionExecutor,
        config: RunConfig,
        scenario: Scenario,
    ) -> Self {
        let disabled = disabled_tools(&scenario.tools);
        if !disabled.is_empty() {
            tracing::info!(?disabled, "tools marked unavailable");
        }
        let dump = config.capture.dump_screenshots.then(|| {
            ScreenshotDump::new(
                config.capture.dump_dir.clone(),
                config.capture.dump_prefix.clone(),
                config.capture.dump_start,
            )
        });
        Self {
            state: LoopState::AwaitingModel,
            provider,
            executor,
            loop_ctrl: LoopController::new(config.agent.max_steps, config.agent.step_delay()),
            transcript: Transcript::new(scenario.system_prompt(), &scenario.task_prompt),
            catalog: scenario.tools,
            disabled,
            run: RunState {
                last_screen: (config.capture.target_width, config.capture.target_height),
                dump,
            },
            config,
            steps_dispatched: 0,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    /// Run to completion. Transport and model errors abort the run.
    pub async fn run(&mut self) -> PilotResult<RunOutcome> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("run", run_id = %run_id);
        self.drive(run_id).instrument(span).await
    }

    async fn drive(&mut self, run_id: String) -> PilotResult<RunOutcome> {
        let started_at = chrono::Utc::now();
        self.prepare().await?;

        let call_cfg = CallConfig {
            model: self.config.model.model.clone(),
            temperature: self.config.model.temperature,
            max_tokens: self.config.model.max_tokens,
        };

        tracing::info!(
            provider = self.provider.name(),
            max_steps = self.config.agent.max_steps,
            keep_last = self.config.capture.keep_last_screenshots,
            tools = self.catalog.len(),
            "run started"
        );

        let stop_reason = loop {
            match self.state.clone() {
                // ── AwaitingModel: one request with the full transcript ─────
                LoopState::AwaitingModel => {
                    if self.loop_ctrl.should_stop() {
                        self.state = LoopState::Done {
                            reason: StopReason::BudgetExhausted,
                        };
                        continue;
                    }
                    self.loop_ctrl.record_step();
                    let step = self.loop_ctrl.steps_taken();
                    tracing::info!(step, turns = self.transcript.len(), "requesting model turn");

                    let response = self
                        .provider
                        .chat(self.transcript.turns(), &self.catalog, &call_cfg)
                        .await?;
                    if !response.reasoning.is_empty() {
                        tracing::debug!(step, reasoning = %response.reasoning, "model reasoning");
                    }

                    let calls = response.tool_calls.clone();
                    self.transcript
                        .push(ChatMessage::assistant(response.content, response.tool_calls));

                    if calls.is_empty() {
                        tracing::info!(step, "no tool calls → Done");
                        self.state = LoopState::Done {
                            reason: StopReason::ModelFinished,
                        };
                    } else {
                        self.state = LoopState::DispatchingTools { calls };
                    }
                }

                // ── DispatchingTools: strictly in order, one result each ────
                LoopState::DispatchingTools { calls } => {
                    for call in &calls {
                        self.dispatch(call).await;
                    }
                    let removed = self
                        .transcript
                        .prune_screenshots(self.config.capture.keep_last_screenshots);
                    self.steps_dispatched += 1;
                    tracing::debug!(
                        calls = calls.len(),
                        removed,
                        turns = self.transcript.len(),
                        "step dispatched"
                    );
                    self.state = LoopState::Pacing;
                }

                // ── Pacing: delay, or stop when the budget is spent ─────────
                LoopState::Pacing => {
                    if self.loop_ctrl.should_stop() {
                        tracing::info!(steps = self.loop_ctrl.steps_taken(), "step budget exhausted → Done");
                        self.state = LoopState::Done {
                            reason: StopReason::BudgetExhausted,
                        };
                    } else {
                        self.loop_ctrl.pace().await;
                        self.state = LoopState::AwaitingModel;
                    }
                }

                LoopState::Done { reason } => break reason,
            }
        };

        let outcome = RunOutcome {
            run_id,
            steps: self.steps_dispatched,
            model_requests: self.loop_ctrl.steps_taken(),
            stop_reason,
            transcript_len: self.transcript.len(),
            started_at,
            finished_at: chrono::Utc::now(),
        };
        tracing::info!(
            reason = ?outcome.stop_reason,
            steps = outcome.steps,
            requests = outcome.model_requests,
            "run finished"
        );
        Ok(outcome)
    }

    async fn prepare(&mut self) -> PilotResult<()> {
        if self.config.capture.dump_screenshots {
            tokio::fs::create_dir_all(&self.config.capture.dump_dir).await?;
        }
        match self.executor.screen_size() {
            Ok(size) => self.run.last_screen = size,
            Err(e) => {
                tracing::warn!(error = %e, "screen size unavailable; using capture target size");
            }
        }
        Ok(())
    }

    /// Route one tool call through the availability filter and the executor,
    /// appending exactly one tool-result turn (plus the screenshot turn).
    async fn dispatch(&mut self, call: &ToolCall) {
        let name = call.function.name.as_str();
        tracing::info!(
            tool = %name,
            call_id = %call.id,
            args = %call.function.arguments,
            "dispatching tool call"
        );

        if self.disabled.contains(name) {
            tracing::warn!(tool = %name, "tool disabled for this scenario");
            self.transcript
                .push(ChatMessage::tool(&call.id, name, TOOL_DISABLED));
            return;
        }

        let tool = Tool::from_name(name);
        let Some(action) = AgentAction::from_tool(&tool, &call.function.arguments) else {
            tracing::warn!(tool = %tool.name(), "unknown tool");
            self.transcript.push(ChatMessage::tool(&call.id, name, UNKNOWN_TOOL));
            return;
        };

        let result = self.executor.execute(&action, &mut self.run).await;
        tracing::debug!(tool = %tool.name(), result = %result.text, "tool result");
        self.transcript
            .push(ChatMessage::tool(&call.id, name, result.text));
        if let Some(image) = result.image_turn {
            self.transcript.push(image);
        }
    }
}
