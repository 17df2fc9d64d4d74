use std::time::Duration;

use rst_common::standard::serde::{self, Deserialize};

use prople_agent_core::identity::connection::rendezvous::DEFAULT_TIMEOUT;
use prople_agent_core::identity::connection::RendezvousConfig;

use crate::common::types::{CommonError, ToValidate};

#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Rendezvous {
    pub(super) timeout_ms: u64,
}

impl Rendezvous {
    pub fn get_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn set_timeout_ms(&mut self, timeout_ms: u64) {
        self.timeout_ms = timeout_ms
    }

    pub fn to_config(&self) -> RendezvousConfig {
        RendezvousConfig::new(self.get_timeout())
    }
}

impl Default for Rendezvous {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
        }
    }
}

impl ToValidate for Rendezvous {
    fn validate(&self) -> Result<(), CommonError> {
        if self.timeout_ms == 0 {
            return Err(CommonError::ValidationError(
                "config: rendezvous:timeout_ms must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// `Simulation` tunes the in-memory agent framework
#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Simulation {
    pub(super) step_delay_ms: u64,
}

impl Simulation {
    pub fn get_step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self { step_delay_ms: 50 }
    }
}
