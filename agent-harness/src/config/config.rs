use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

use super::{Agent, Credential, Rendezvous, Simulation};

#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Config {
    #[serde(default)]
    pub(super) rendezvous: Rendezvous,

    #[serde(default)]
    pub(super) simulation: Simulation,

    #[serde(default)]
    pub(super) credential: Credential,

    pub(super) issuer: Agent,
    pub(super) holder: Agent,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rendezvous(&self) -> &Rendezvous {
        &self.rendezvous
    }

    pub fn rendezvous_mut(&mut self) -> &mut Rendezvous {
        &mut self.rendezvous
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn issuer(&self) -> &Agent {
        &self.issuer
    }

    pub fn holder(&self) -> &Agent {
        &self.holder
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rendezvous: Rendezvous::default(),
            simulation: Simulation::default(),
            credential: Credential::default(),
            issuer: Agent::default(),
            holder: Agent::default(),
        }
    }
}

impl ToValidate for Config {
    fn validate(&self) -> Result<(), CommonError> {
        _ = self.rendezvous.validate()?;
        _ = self.credential.validate()?;
        _ = self.issuer.validate()?;
        _ = self.holder.validate()?;

        if self.issuer.label == self.holder.label {
            return Err(CommonError::ValidationError(
                "config: issuer and holder must use different labels".to_string(),
            ));
        }

        Ok(())
    }
}
