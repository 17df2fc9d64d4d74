use std::collections::BTreeMap;

use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

/// `Credential` describes what the issuer registers, issues and later asks a proof for
#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Credential {
    pub(super) did_method: String,
    pub(super) network: String,
    pub(super) schema_name: String,
    pub(super) schema_version: String,
    pub(super) attributes: Vec<String>,
    pub(super) tag: String,
    pub(super) values: BTreeMap<String, String>,
    pub(super) proof_attribute: String,
}

impl Credential {
    pub fn get_did_method(&self) -> (String, String) {
        (self.did_method.to_owned(), self.network.to_owned())
    }

    pub fn get_schema(&self) -> (String, String, Vec<String>) {
        (
            self.schema_name.to_owned(),
            self.schema_version.to_owned(),
            self.attributes.to_owned(),
        )
    }

    pub fn get_tag(&self) -> String {
        self.tag.to_owned()
    }

    pub fn get_values(&self) -> BTreeMap<String, String> {
        self.values.to_owned()
    }

    pub fn get_proof_attribute(&self) -> String {
        self.proof_attribute.to_owned()
    }
}

impl Default for Credential {
    fn default() -> Self {
        let mut values = BTreeMap::new();
        values.insert("name".to_string(), "Jane Doe".to_string());
        values.insert("age".to_string(), "23".to_string());

        Self {
            did_method: "prople".to_string(),
            network: "testnet".to_string(),
            schema_name: "Example Schema to register".to_string(),
            schema_version: "1.0.0".to_string(),
            attributes: vec!["name".to_string(), "age".to_string()],
            tag: "latest".to_string(),
            values,
            proof_attribute: "name".to_string(),
        }
    }
}

impl ToValidate for Credential {
    fn validate(&self) -> Result<(), CommonError> {
        if self.did_method.is_empty() {
            return Err(CommonError::ValidationError(
                "config: credential:did_method is missing".to_string(),
            ));
        }

        if self.attributes.is_empty() {
            return Err(CommonError::ValidationError(
                "config: credential:attributes is empty".to_string(),
            ));
        }

        if let Some(unknown) = self
            .values
            .keys()
            .find(|name| !self.attributes.contains(name))
        {
            return Err(CommonError::ValidationError(format!(
                "config: credential:values has unknown attribute: {}",
                unknown
            )));
        }

        if !self.attributes.contains(&self.proof_attribute) {
            return Err(CommonError::ValidationError(format!(
                "config: credential:proof_attribute is not an attribute: {}",
                self.proof_attribute
            )));
        }

        Ok(())
    }
}
