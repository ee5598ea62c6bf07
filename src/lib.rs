pub mod agent_engine;
pub mod config;
pub mod errors;
pub mod executor;
pub mod llm;
pub mod perception;
pub mod scenario;

use std::sync::Arc;

use crate::agent_engine::engine::AgentEngine;
use crate::agent_engine::state::RunOutcome;
use crate::config::RunConfig;
use crate::errors::PilotResult;
use crate::executor::dispatcher::ActionExecutor;
use crate::executor::input::EnigoInput;
use crate::llm::providers::openai_compatible::OpenAiCompatibleProvider;
use crate::perception::screenshot::XcapScreen;
use crate::scenario::Scenario;

/// Install the global fmt subscriber. `RUST_LOG` wins over the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Wire the production collaborators (HTTP model endpoint, xcap, enigo) and
/// run one scenario to completion.
pub async fn run(config: RunConfig, scenario: Scenario) -> PilotResult<RunOutcome> {
    let provider = OpenAiCompatibleProvider::new(
        "openai_compatible".into(),
        config.model.endpoint.clone(),
        config.model.api_key.clone(),
        config.model.timeout(),
    )?;
    let executor = ActionExecutor::new(
        Box::new(XcapScreen::new()),
        Box::new(EnigoInput::new()?),
        (config.capture.target_width, config.capture.target_height),
        config.agent.settle_delay(),
    );

    let mut engine = AgentEngine::new(Arc::new(provider), executor, config, scenario);
    engine.run().await
}
