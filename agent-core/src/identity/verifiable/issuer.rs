use rst_common::with_logging::log::{debug, info};

use crate::identity::connection::ConnectionRecord;

use super::types::{
    CredentialAttribute, CredentialDefinitionState, CredentialDefinitionTemplate, CredentialOffer,
    CredentialExchangeRecord, IssuerFrameworkBuilder, MessengerBuilder, ProofExchangeRecord,
    ProofRequest, SchemaState, SchemaTemplate, VerifiableError,
};

/// `Issuer` drives the issuer side of the demo: DID, schema, credential definition,
/// credential offers and proof requests
///
/// Connection scoped operations receive the [`ConnectionRecord`] produced by the
/// rendezvous instead of reading a stored connection id
pub struct Issuer<TFramework, TMessenger>
where
    TFramework: IssuerFrameworkBuilder,
    TMessenger: MessengerBuilder,
{
    framework: TFramework,
    messenger: TMessenger,
}

impl<TFramework, TMessenger> Issuer<TFramework, TMessenger>
where
    TFramework: IssuerFrameworkBuilder,
    TMessenger: MessengerBuilder,
{
    pub fn new(framework: TFramework, messenger: TMessenger) -> Self {
        Self {
            framework,
            messenger,
        }
    }

    pub async fn create_did(&self, method: &str, network: &str) -> Result<String, VerifiableError> {
        debug!("[issuer:create_did] creating did: {} | {}", method, network);

        let did = self.framework.create_did(method, network).await?;
        info!("[issuer:create_did] did created: {}", did);

        Ok(did)
    }

    pub async fn register_schema(
        &self,
        issuer_id: &str,
        name: &str,
        version: &str,
        attributes: Vec<String>,
    ) -> Result<String, VerifiableError> {
        if issuer_id.is_empty() {
            return Err(VerifiableError::MissingIssuerId);
        }

        let template = SchemaTemplate {
            attr_names: attributes,
            issuer_id: issuer_id.to_string(),
            name: name.to_string(),
            version: version.to_string(),
        };

        match self.framework.register_schema(&template).await? {
            SchemaState::Finished { schema_id } => {
                info!("[issuer:register_schema] schema registered: {}", schema_id);
                Ok(schema_id)
            }
            SchemaState::Failed { reason } => Err(VerifiableError::SchemaError(reason)),
        }
    }

    pub async fn register_credential_definition(
        &self,
        issuer_id: &str,
        schema_id: &str,
        tag: &str,
    ) -> Result<String, VerifiableError> {
        if issuer_id.is_empty() {
            return Err(VerifiableError::MissingIssuerId);
        }

        let template = CredentialDefinitionTemplate {
            schema_id: schema_id.to_string(),
            issuer_id: issuer_id.to_string(),
            tag: tag.to_string(),
        };

        match self.framework.register_credential_definition(&template).await? {
            CredentialDefinitionState::Finished {
                credential_definition_id,
            } => {
                info!(
                    "[issuer:register_credential_definition] credential definition registered: {}",
                    credential_definition_id
                );
                Ok(credential_definition_id)
            }
            CredentialDefinitionState::Failed { reason } => {
                Err(VerifiableError::CredentialDefinitionError(reason))
            }
            _ => Err(VerifiableError::CredentialDefinitionError(
                "Not Finished".to_string(),
            )),
        }
    }

    pub async fn issue_credential(
        &self,
        connection: &ConnectionRecord,
        credential_definition_id: &str,
        attributes: Vec<CredentialAttribute>,
    ) -> Result<CredentialExchangeRecord, VerifiableError> {
        ensure_connected(connection)?;

        let offer = CredentialOffer {
            credential_definition_id: credential_definition_id.to_string(),
            attributes,
        };

        let record = self
            .framework
            .offer_credential(connection.get_id(), &offer)
            .await?;

        info!(
            "[issuer:issue_credential] credential offered: {} | connection: {}",
            record.id,
            connection.get_id()
        );
        Ok(record)
    }

    pub async fn send_proof_request(
        &self,
        connection: &ConnectionRecord,
        credential_definition_id: &str,
        attribute: &str,
    ) -> Result<ProofExchangeRecord, VerifiableError> {
        ensure_connected(connection)?;

        let request = ProofRequest::restricted_to(attribute, credential_definition_id);
        let record = self
            .framework
            .request_proof(connection.get_id(), &request)
            .await?;

        info!(
            "[issuer:send_proof_request] proof request sent: {}",
            record.id
        );
        Ok(record)
    }

    pub async fn proof_record(&self, id: &str) -> Result<ProofExchangeRecord, VerifiableError> {
        self.framework.get_proof_record(id).await
    }

    pub async fn send_message(
        &self,
        connection: &ConnectionRecord,
        message: &str,
    ) -> Result<(), VerifiableError> {
        ensure_connected(connection)?;
        self.messenger
            .send_message(connection.get_id(), message)
            .await
    }
}

pub(crate) fn ensure_connected(connection: &ConnectionRecord) -> Result<(), VerifiableError> {
    if !connection.is_connected() {
        return Err(VerifiableError::NotConnected(connection.get_id().to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use mockall::predicate::eq;

    use rst_common::standard::async_trait::async_trait;
    use rst_common::with_tokio::tokio;

    use crate::identity::connection::types::{ConnectionState, CorrelationId};
    use crate::identity::verifiable::types::{CredentialState, ProofState};

    mock!(
        FakeFramework{}

        impl Clone for FakeFramework {
            fn clone(&self) -> Self;
        }

        #[async_trait]
        impl IssuerFrameworkBuilder for FakeFramework {
            async fn create_did(&self, method: &str, network: &str) -> Result<String, VerifiableError>;
            async fn register_schema(&self, template: &SchemaTemplate) -> Result<SchemaState, VerifiableError>;
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
    );

    mock!(
        FakeMessenger{}

        impl Clone for FakeMessenger {
            fn clone(&self) -> Self;
        }

        #[async_trait]
        impl MessengerBuilder for FakeMessenger {
            async fn send_message(&self, connection_id: &str, message: &str) -> Result<(), VerifiableError>;
        }
    );

    fn connection(state: ConnectionState) -> ConnectionRecord {
        ConnectionRecord::new(CorrelationId::from("inv-1"), state).with_id("conn-1")
    }

    #[tokio::test]
    async fn test_create_did() {
        let mut framework = MockFakeFramework::new();
        framework
            .expect_create_did()
            .with(eq("cheqd"), eq("testnet"))
            .times(1)
            .returning(|_, _| Ok("did:cheqd:testnet:1234".to_string()));

        let issuer = Issuer::new(framework, MockFakeMessenger::new());
        let did = issuer.create_did("cheqd", "testnet").await;
        assert!(!did.is_err());
        assert_eq!(did.unwrap(), "did:cheqd:testnet:1234")
    }

    #[tokio::test]
    async fn test_register_schema_finished() {
        let mut framework = MockFakeFramework::new();
        framework
            .expect_register_schema()
            .withf(|template| template.issuer_id == "did:1" && template.attr_names == vec!["name".to_string()])
            .returning(|_| {
                Ok(SchemaState::Finished {
                    schema_id: "schema-1".to_string(),
                })
            });

        let issuer = Issuer::new(framework, MockFakeMessenger::new());
        let schema = issuer
            .register_schema("did:1", "Example Schema", "1.0.0", vec!["name".to_string()])
            .await;
        assert!(!schema.is_err());
        assert_eq!(schema.unwrap(), "schema-1")
    }

    #[tokio::test]
    async fn test_register_schema_failed() {
        let mut framework = MockFakeFramework::new();
        framework.expect_register_schema().returning(|_| {
            Ok(SchemaState::Failed {
                reason: "ledger rejected".to_string(),
            })
        });

        let issuer = Issuer::new(framework, MockFakeMessenger::new());
        let schema = issuer
            .register_schema("did:1", "Example Schema", "1.0.0", vec!["name".to_string()])
            .await;
        assert!(schema.is_err());
        assert_eq!(
            schema.unwrap_err(),
            VerifiableError::SchemaError("ledger rejected".to_string())
        )
    }

    #[tokio::test]
    async fn test_register_without_issuer_id() {
        let framework = MockFakeFramework::new();
        let issuer = Issuer::new(framework, MockFakeMessenger::new());

        let schema = issuer
            .register_schema("", "Example Schema", "1.0.0", vec![])
            .await;
        assert!(matches!(schema.unwrap_err(), VerifiableError::MissingIssuerId));

        let cred_def = issuer
            .register_credential_definition("", "schema-1", "latest")
            .await;
        assert!(matches!(cred_def.unwrap_err(), VerifiableError::MissingIssuerId));
    }

    #[tokio::test]
    async fn test_register_credential_definition_states() {
        let table = vec![
            (
                CredentialDefinitionState::Finished {
                    credential_definition_id: "cred-def-1".to_string(),
                },
                Ok("cred-def-1".to_string()),
            ),
            (
                CredentialDefinitionState::Failed {
                    reason: "no schema".to_string(),
                },
                Err(VerifiableError::CredentialDefinitionError("no schema".to_string())),
            ),
            (
                CredentialDefinitionState::Wait,
                Err(VerifiableError::CredentialDefinitionError("Not Finished".to_string())),
            ),
            (
                CredentialDefinitionState::Action,
                Err(VerifiableError::CredentialDefinitionError("Not Finished".to_string())),
            ),
        ];

        for (state, expected) in table {
            let mut framework = MockFakeFramework::new();
            framework
                .expect_register_credential_definition()
                .return_once(move |_| Ok(state));

            let issuer = Issuer::new(framework, MockFakeMessenger::new());
            let result = issuer
                .register_credential_definition("did:1", "schema-1", "latest")
                .await;
            assert_eq!(result, expected);
        }
    }

    #[tokio::test]
    async fn test_issue_credential() {
        let mut framework = MockFakeFramework::new();
        framework
            .expect_offer_credential()
            .withf(|connection_id, offer| {
                connection_id == "conn-1" && offer.credential_definition_id == "cred-def-1"
            })
            .times(1)
            .returning(|connection_id, offer| {
                Ok(CredentialExchangeRecord {
                    id: "cred-ex-1".to_string(),
                    connection_id: connection_id.to_string(),
                    credential_definition_id: offer.credential_definition_id.clone(),
                    attributes: offer.attributes.clone(),
                    state: CredentialState::OfferSent,
                })
            });

        let issuer = Issuer::new(framework, MockFakeMessenger::new());
        let record = issuer
            .issue_credential(
                &connection(ConnectionState::Completed),
                "cred-def-1",
                vec![CredentialAttribute::new("name", "Jane Doe")],
            )
            .await;

        assert!(!record.is_err());
        let record = record.unwrap();
        assert_eq!(record.state, CredentialState::OfferSent);
        assert_eq!(record.attributes.len(), 1);
    }

    #[tokio::test]
    async fn test_issue_credential_not_connected() {
        let mut framework = MockFakeFramework::new();
        framework.expect_offer_credential().times(0);

        let issuer = Issuer::new(framework, MockFakeMessenger::new());
        let record = issuer
            .issue_credential(&connection(ConnectionState::Requested), "cred-def-1", vec![])
            .await;

        assert_eq!(
            record.unwrap_err(),
            VerifiableError::NotConnected("conn-1".to_string())
        )
    }

    #[tokio::test]
    async fn test_send_proof_request() {
        let mut framework = MockFakeFramework::new();
        framework
            .expect_request_proof()
            .withf(|connection_id, request| {
                let restricted = request
                    .requested_attributes
                    .get("name")
                    .map(|attr| attr.restrictions.contains(&"cred-def-1".to_string()))
                    .unwrap_or(false);

                connection_id == "conn-1" && restricted
            })
            .returning(|connection_id, request| {
                Ok(ProofExchangeRecord {
                    id: "proof-1".to_string(),
                    connection_id: connection_id.to_string(),
                    request: request.clone(),
                    state: ProofState::RequestSent,
                    is_verified: None,
                })
            });

        let issuer = Issuer::new(framework, MockFakeMessenger::new());
        let record = issuer
            .send_proof_request(&connection(ConnectionState::Completed), "cred-def-1", "name")
            .await;

        assert!(!record.is_err());
        assert_eq!(record.unwrap().state, ProofState::RequestSent)
    }

    #[tokio::test]
    async fn test_send_message() {
        let mut messenger = MockFakeMessenger::new();
        messenger
            .expect_send_message()
            .with(eq("conn-1"), eq("hello"))
            .times(1)
            .returning(|_, _| Ok(()));

        let issuer = Issuer::new(MockFakeFramework::new(), messenger);
        let sent = issuer
            .send_message(&connection(ConnectionState::Completed), "hello")
            .await;
        assert!(!sent.is_err());
    }
}
