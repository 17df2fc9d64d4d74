use rst_common::with_logging::log::{info, warn};
use rst_common::with_tokio::tokio;

use prople_agent_core::identity::connection::types::{ConnectionError, CorrelationId};
use prople_agent_core::identity::connection::{ConnectionRecord, Rendezvous};
use prople_agent_core::identity::invitation::Usecase;
use prople_agent_core::identity::verifiable::types::CredentialAttribute;
use prople_agent_core::identity::verifiable::{Holder, Issuer};

use crate::common::types::CommonError;
use crate::config::Config;
use crate::framework::{MemoryAgent, MemoryNetwork};

pub const GREETING_MESSAGE: &str = "Hello from the issuer, the credential is on its way";

/// `DemoSummary` collects the identifiers produced by a completed demo
#[derive(Debug, Clone)]
pub struct DemoSummary {
    pub correlation_id: CorrelationId,
    pub issuer_connection: ConnectionRecord,
    pub holder_connection: ConnectionRecord,
    pub issuer_did: String,
    pub schema_id: String,
    pub credential_definition_id: String,
    pub credential_record_id: String,
    pub proof_record_id: String,
    pub proof_verified: bool,
}

#[derive(Debug, Clone)]
pub enum DemoOutcome {
    Completed(DemoSummary),

    /// The connection did not complete in time, the demo stops without retrying
    Idle { correlation_id: CorrelationId },
}

enum Connected {
    Both(ConnectionRecord, ConnectionRecord),
    TimedOut,
}

/// `DemoFlow` runs the issuer and the holder agents through one full exchange
pub struct DemoFlow {
    config: Config,
    issuer_agent: MemoryAgent,
    holder_agent: MemoryAgent,
}

impl DemoFlow {
    pub fn new(config: Config) -> Self {
        let network = MemoryNetwork::new(config.simulation().get_step_delay());
        let issuer_agent = MemoryAgent::new(config.issuer().get_label(), network.clone());
        let holder_agent = MemoryAgent::new(config.holder().get_label(), network);

        Self {
            config,
            issuer_agent,
            holder_agent,
        }
    }

    pub fn issuer_agent(&self) -> &MemoryAgent {
        &self.issuer_agent
    }

    pub fn holder_agent(&self) -> &MemoryAgent {
        &self.holder_agent
    }

    pub async fn run(&self) -> Result<DemoOutcome, CommonError> {
        let invitations = Usecase::new(self.issuer_agent.clone(), self.holder_agent.clone());

        let invitation = invitations
            .invite(&self.config.issuer().get_domain())
            .await
            .map_err(flow_error)?;
        let correlation_id = invitation.correlation_id().clone();

        let _ = invitations
            .accept(invitation.get_url())
            .await
            .map_err(flow_error)?;

        let (issuer_connection, holder_connection) = match self.connect(&correlation_id).await? {
            Connected::Both(issuer, holder) => (issuer, holder),
            Connected::TimedOut => {
                warn!(
                    "[demo:run] connection not completed in time, staying idle: {}",
                    correlation_id.as_str()
                );
                return Ok(DemoOutcome::Idle { correlation_id });
            }
        };

        info!(
            "[demo:run] connected: issuer: {} | holder: {}",
            issuer_connection.get_id(),
            holder_connection.get_id()
        );

        let issuer = Issuer::new(self.issuer_agent.clone(), self.issuer_agent.clone());
        let holder = Holder::new(self.holder_agent.clone(), self.holder_agent.clone());
        let credential = self.config.credential();

        let (method, network) = credential.get_did_method();
        let issuer_did = issuer
            .create_did(&method, &network)
            .await
            .map_err(flow_error)?;

        let (schema_name, schema_version, attributes) = credential.get_schema();
        let schema_id = issuer
            .register_schema(&issuer_did, &schema_name, &schema_version, attributes)
            .await
            .map_err(flow_error)?;

        let credential_definition_id = issuer
            .register_credential_definition(&issuer_did, &schema_id, &credential.get_tag())
            .await
            .map_err(flow_error)?;

        let values = credential
            .get_values()
            .into_iter()
            .map(|(name, value)| CredentialAttribute::new(name, value))
            .collect();

        let offered = issuer
            .issue_credential(&issuer_connection, &credential_definition_id, values)
            .await
            .map_err(flow_error)?;

        let accepted = holder
            .accept_credential_offer(&offered)
            .await
            .map_err(flow_error)?;

        let requested = issuer
            .send_proof_request(
                &issuer_connection,
                &credential_definition_id,
                &credential.get_proof_attribute(),
            )
            .await
            .map_err(flow_error)?;

        let _ = holder
            .accept_proof_request(&requested)
            .await
            .map_err(flow_error)?;

        let proof = issuer
            .proof_record(&requested.id)
            .await
            .map_err(flow_error)?;
        let proof_verified = proof.is_verified.unwrap_or(false);
        info!(
            "[demo:run] proof {} verified: {}",
            proof.id, proof_verified
        );

        issuer
            .send_message(&issuer_connection, GREETING_MESSAGE)
            .await
            .map_err(flow_error)?;

        Ok(DemoOutcome::Completed(DemoSummary {
            correlation_id,
            issuer_connection,
            holder_connection,
            issuer_did,
            schema_id,
            credential_definition_id,
            credential_record_id: accepted.id,
            proof_record_id: proof.id,
            proof_verified,
        }))
    }

    /// `connect` waits on both sides of the invitation at the same time
    async fn connect(&self, correlation_id: &CorrelationId) -> Result<Connected, CommonError> {
        let config = self.config.rendezvous().to_config();
        let issuer_side = Rendezvous::new(
            self.issuer_agent.clone(),
            self.issuer_agent.clone(),
            config,
        );
        let holder_side = Rendezvous::new(
            self.holder_agent.clone(),
            self.holder_agent.clone(),
            config,
        );

        let (issuer_connection, holder_connection) = tokio::join!(
            issuer_side.await_connected(correlation_id),
            holder_side.await_connected(correlation_id)
        );

        match (issuer_connection, holder_connection) {
            (Ok(issuer), Ok(holder)) => Ok(Connected::Both(issuer, holder)),
            (Err(ConnectionError::Timeout { .. }), _) | (_, Err(ConnectionError::Timeout { .. })) => {
                Ok(Connected::TimedOut)
            }
            (Err(err), _) | (_, Err(err)) => Err(flow_error(err)),
        }
    }
}

fn flow_error(err: impl ToString) -> CommonError {
    CommonError::FlowError(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use prople_agent_core::identity::verifiable::types::VerifiableError;

    use crate::common::helpers::testconfig::{fixture, global_config};
    use crate::ConfigManager;

    #[tokio::test]
    async fn test_run_completed() {
        let flow = DemoFlow::new(global_config().clone());
        let outcome = flow.run().await;
        assert!(!outcome.is_err());

        let summary = match outcome.unwrap() {
            DemoOutcome::Completed(summary) => summary,
            DemoOutcome::Idle { correlation_id } => {
                panic!("unexpected idle: {}", correlation_id.as_str())
            }
        };

        assert!(summary.issuer_connection.is_connected());
        assert!(summary.holder_connection.is_connected());
        assert_eq!(
            summary.issuer_connection.get_correlation_id(),
            &summary.correlation_id
        );
        assert!(summary.issuer_did.starts_with("did:"));
        assert!(summary.proof_verified);

        let inbox = flow.holder_agent().inbox();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].content, GREETING_MESSAGE);
        assert_eq!(inbox[0].connection_id, summary.holder_connection.get_id());

        assert_eq!(flow.issuer_agent().subscriptions(), 0);
        assert_eq!(flow.holder_agent().subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_run_idle_on_timeout() {
        let config = ConfigManager::new(fixture("config_timeout.toml"))
            .parse()
            .unwrap();

        let flow = DemoFlow::new(config);
        let outcome = flow.run().await;
        assert!(!outcome.is_err());
        assert!(matches!(outcome.unwrap(), DemoOutcome::Idle { .. }));

        assert_eq!(flow.issuer_agent().subscriptions(), 0);
        assert_eq!(flow.holder_agent().subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_run_holder_unavailable() {
        let flow = DemoFlow::new(global_config().clone());
        flow.holder_agent().shutdown();

        let outcome = flow.run().await;
        assert!(outcome.is_err());
        assert!(matches!(outcome.unwrap_err(), CommonError::FlowError(_)));
    }

    #[test]
    fn test_flow_error_message() {
        let err = flow_error(VerifiableError::MissingIssuerId);
        assert_eq!(
            err,
            CommonError::FlowError("missing anoncreds issuer id".to_string())
        );
    }
}
