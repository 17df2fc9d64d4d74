use std::collections::BTreeMap;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::with_errors::thiserror::{self, Error};

pub const PROOF_REQUEST_NAME: &str = "proof-request";
pub const PROOF_REQUEST_VERSION: &str = "1.0";

/// `VerifiableError` provides all specific error types relate with schema, credential
/// and proof flows delegated to the agent framework
#[derive(Debug, PartialEq, Error, Clone)]
pub enum VerifiableError {
    #[error("unable to create did: {0}")]
    CreateDIDError(String),

    #[error("missing anoncreds issuer id")]
    MissingIssuerId,

    #[error("error creating schema: {0}")]
    SchemaError(String),

    #[error("error registering credential definition: {0}")]
    CredentialDefinitionError(String),

    #[error("connection is not established: {0}")]
    NotConnected(String),

    #[error("credential error: {0}")]
    CredentialError(String),

    #[error("proof error: {0}")]
    ProofError(String),

    #[error("message error: {0}")]
    MessageError(String),

    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct SchemaTemplate {
    pub attr_names: Vec<String>,
    pub issuer_id: String,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub enum SchemaState {
    Finished { schema_id: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct CredentialDefinitionTemplate {
    pub schema_id: String,
    pub issuer_id: String,
    pub tag: String,
}

/// `CredentialDefinitionState` mirrors the registration states a registry may report
///
/// Only [`CredentialDefinitionState::Finished`] is usable, `Wait` and `Action` mean the
/// registration needs more steps the demo does not drive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub enum CredentialDefinitionState {
    Finished { credential_definition_id: String },
    Failed { reason: String },
    Wait,
    Action,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct CredentialAttribute {
    pub name: String,
    pub value: String,
}

impl CredentialAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct CredentialOffer {
    pub credential_definition_id: String,
    pub attributes: Vec<CredentialAttribute>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub enum CredentialState {
    OfferSent,
    OfferReceived,
    RequestSent,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct CredentialExchangeRecord {
    pub id: String,
    pub connection_id: String,
    pub credential_definition_id: String,
    pub attributes: Vec<CredentialAttribute>,
    pub state: CredentialState,
}

/// `RequestedAttribute` asks for one attribute, optionally restricted to credentials
/// issued under one of the given credential definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct RequestedAttribute {
    pub name: String,
    pub restrictions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct ProofRequest {
    pub name: String,
    pub version: String,
    pub requested_attributes: BTreeMap<String, RequestedAttribute>,
}

impl ProofRequest {
    /// `restricted_to` requests a single attribute restricted to one credential definition
    pub fn restricted_to(attribute: &str, credential_definition_id: &str) -> Self {
        let mut requested_attributes = BTreeMap::new();
        requested_attributes.insert(
            attribute.to_string(),
            RequestedAttribute {
                name: attribute.to_string(),
                restrictions: vec![credential_definition_id.to_string()],
            },
        );

        Self {
            name: PROOF_REQUEST_NAME.to_string(),
            version: PROOF_REQUEST_VERSION.to_string(),
            requested_attributes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub enum ProofState {
    RequestSent,
    RequestReceived,
    PresentationSent,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct ProofExchangeRecord {
    pub id: String,
    pub connection_id: String,
    pub request: ProofRequest,
    pub state: ProofState,
    pub is_verified: Option<bool>,
}

/// `SelectedCredentials` maps each requested attribute referent to the credential
/// chosen to satisfy it
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct SelectedCredentials {
    pub attributes: BTreeMap<String, String>,
}

/// `IssuerFrameworkBuilder` is the issuer/verifier part of the external agent framework
#[async_trait]
pub trait IssuerFrameworkBuilder: Clone + Send + Sync {
    async fn create_did(&self, method: &str, network: &str) -> Result<String, VerifiableError>;

    async fn register_schema(
        &self,
        template: &SchemaTemplate,
    ) -> Result<SchemaState, VerifiableError>;

    async fn register_credential_definition(
        &self,
        template: &CredentialDefinitionTemplate,
    ) -> Result<CredentialDefinitionState, VerifiableError>;

    async fn offer_credential(
        &self,
        connection_id: &str,
        offer: &CredentialOffer,
    ) -> Result<CredentialExchangeRecord, VerifiableError>;

    async fn request_proof(
        &self,
        connection_id: &str,
        request: &ProofRequest,
    ) -> Result<ProofExchangeRecord, VerifiableError>;

    async fn get_proof_record(&self, id: &str) -> Result<ProofExchangeRecord, VerifiableError>;
}

/// `HolderFrameworkBuilder` is the holder part of the external agent framework
#[async_trait]
pub trait HolderFrameworkBuilder: Clone + Send + Sync {
    async fn link_secret_ids(&self) -> Result<Vec<String>, VerifiableError>;

    async fn create_link_secret(&self) -> Result<String, VerifiableError>;

    async fn accept_offer(
        &self,
        credential_record_id: &str,
    ) -> Result<CredentialExchangeRecord, VerifiableError>;

    async fn select_credentials_for_request(
        &self,
        proof_record_id: &str,
    ) -> Result<SelectedCredentials, VerifiableError>;

    async fn accept_request(
        &self,
        proof_record_id: &str,
        selected: &SelectedCredentials,
    ) -> Result<ProofExchangeRecord, VerifiableError>;
}

/// `MessengerBuilder` sends basic messages over an established connection
#[async_trait]
pub trait MessengerBuilder: Clone + Send + Sync {
    async fn send_message(&self, connection_id: &str, message: &str)
        -> Result<(), VerifiableError>;
}
