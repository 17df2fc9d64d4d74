//! `prople-agent-harness` wires the connection rendezvous into a runnable demo
//!
//! It provides the TOML configuration, an in-memory agent framework standing in
//! for a real one, and the [`flow::DemoFlow`] driving an issuer and a holder
//! from invitation to proof verification
pub mod common;
pub mod config;
pub mod flow;
pub mod framework;

pub use config::Parser as ConfigManager;

use common::helpers;
use common::types::CommonError;
use config::Config;
use flow::DemoFlow;

/// `AgentHarness` loads and validates the configuration used to build a [`DemoFlow`]
pub struct AgentHarness {
    config: Config,
}

impl AgentHarness {
    pub fn new(conf_file: String) -> Result<Self, CommonError> {
        let config = ConfigManager::new(conf_file)
            .parse()
            .map_err(|err| CommonError::ConfigError(err.to_string()))?;

        let _ = helpers::validate(config.clone())?;
        Ok(Self { config })
    }

    /// `with_timeout_ms` overrides the configured rendezvous timeout
    pub fn with_timeout_ms(mut self, timeout_ms: Option<u64>) -> Result<Self, CommonError> {
        if let Some(timeout_ms) = timeout_ms {
            self.config.rendezvous_mut().set_timeout_ms(timeout_ms);
            let _ = helpers::validate(self.config.rendezvous().clone())?;
        }

        Ok(self)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn build_flow(&self) -> DemoFlow {
        DemoFlow::new(self.config.clone())
    }
}
