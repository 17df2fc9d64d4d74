use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Wallet {
    pub(super) id: String,
    pub(super) key: String,
}

impl Wallet {
    pub fn get_id(&self) -> String {
        self.id.to_owned()
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self {
            id: "".to_string(),
            key: "".to_string(),
        }
    }
}

impl ToValidate for Wallet {
    fn validate(&self) -> Result<(), CommonError> {
        if self.id.is_empty() {
            return Err(CommonError::ValidationError(
                "config: wallet:id is missing".to_string(),
            ));
        }

        if self.key.is_empty() {
            return Err(CommonError::ValidationError(
                "config: wallet:key is missing".to_string(),
            ));
        }

        Ok(())
    }
}

/// `Agent` configures one side of the demo, either the issuer or the holder
///
/// When `domain` is not given the invitation url is built from the local endpoint
#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Agent {
    pub(super) label: String,
    pub(super) port: u16,

    #[serde(default)]
    pub(super) domain: Option<String>,

    pub(super) wallet: Wallet,
}

impl Agent {
    pub fn get_label(&self) -> String {
        self.label.to_owned()
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn get_endpoint(&self) -> String {
        format!("http://localhost:{}", self.port)
    }

    pub fn get_domain(&self) -> String {
        self.domain
            .to_owned()
            .unwrap_or_else(|| self.get_endpoint())
    }

    pub fn get_wallet(&self) -> &Wallet {
        &self.wallet
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self {
            label: "".to_string(),
            port: 3002,
            domain: None,
            wallet: Wallet::default(),
        }
    }
}

impl ToValidate for Agent {
    fn validate(&self) -> Result<(), CommonError> {
        if self.label.is_empty() {
            return Err(CommonError::ValidationError(
                "config: agent:label is missing".to_string(),
            ));
        }

        if self.port == 0 {
            return Err(CommonError::ValidationError(
                "config: agent:port must be greater than zero".to_string(),
            ));
        }

        _ = self.wallet.validate()?;

        Ok(())
    }
}
