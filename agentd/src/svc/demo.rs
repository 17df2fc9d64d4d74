use rst_common::with_logging::log::{info, warn};
use rst_common::with_tracing::tracing_subscriber::{
    self, layer::SubscriberExt, util::SubscriberInitExt,
};

use prople_agent_harness::common::types::CommonError;
use prople_agent_harness::flow::DemoOutcome;
use prople_agent_harness::AgentHarness;

use crate::errors::AgentdError;

pub struct Demo {
    config: String,
    timeout_ms: Option<u64>,
}

impl Demo {
    pub fn new(config: String, timeout_ms: Option<u64>) -> Demo {
        Self { config, timeout_ms }
    }

    /// `setup_logging` installs the global subscriber, a second call is a no-op
    pub fn setup_logging(&self) {
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    format!(
                        "{}=debug,prople_agent_harness=debug,prople_agent_core=debug",
                        env!("CARGO_CRATE_NAME")
                    )
                    .into()
                }),
            )
            .with(tracing_subscriber::fmt::layer().without_time())
            .try_init();
    }

    pub fn harness(&self) -> Result<AgentHarness, AgentdError> {
        AgentHarness::new(self.config.to_owned())
            .and_then(|harness| harness.with_timeout_ms(self.timeout_ms))
            .map_err(|err| AgentdError::ConfigError(err.to_string()))
    }

    pub async fn run(&self) -> Result<DemoOutcome, AgentdError> {
        let harness = self.harness()?;
        let flow = harness.build_flow();

        let outcome = flow
            .run()
            .await
            .map_err(|err: CommonError| AgentdError::DemoError(err.to_string()))?;

        match &outcome {
            DemoOutcome::Completed(summary) => {
                info!(
                    "[agentd:demo] completed: connection: {} | credential: {} | proof verified: {}",
                    summary.issuer_connection.get_id(),
                    summary.credential_record_id,
                    summary.proof_verified
                );
            }
            DemoOutcome::Idle { correlation_id } => {
                warn!(
                    "[agentd:demo] idle, connection not established: {}",
                    correlation_id.as_str()
                );
            }
        }

        Ok(outcome)
    }
}
