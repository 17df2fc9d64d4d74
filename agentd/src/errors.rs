use rst_common::with_errors::thiserror::{self, Error};

#[derive(Debug, Error)]
pub enum AgentdError {
    #[error("config error: {0}")]
    ConfigError(String),

    #[error("demo error: {0}")]
    DemoError(String),
}
