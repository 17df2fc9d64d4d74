use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use prople_did_core::did::DID;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::uuid::Uuid;
use rst_common::with_logging::log::{debug, info, warn};
use rst_common::with_tokio::tokio::{self, time};

use prople_agent_core::identity::connection::types::{
    ConnectionError, ConnectionState, ConnectionStateChanged, CorrelationId, EventHandler,
    EventKind, EventSourceBuilder, PollSourceBuilder, SubscriptionHandle,
};
use prople_agent_core::identity::connection::ConnectionRecord;
use prople_agent_core::identity::invitation::types::{
    InvitationError, InviteeBuilder, InviterBuilder,
};
use prople_agent_core::identity::invitation::{InvitationUrl, OutOfBandInvitation};
use prople_agent_core::identity::verifiable::types::{
    CredentialDefinitionState, CredentialDefinitionTemplate, CredentialExchangeRecord,
    CredentialOffer, CredentialState, HolderFrameworkBuilder, IssuerFrameworkBuilder,
    MessengerBuilder, ProofExchangeRecord, ProofRequest, ProofState, SchemaState, SchemaTemplate,
    SelectedCredentials, VerifiableError,
};

use super::events::EventBus;
use super::network::MemoryNetwork;

pub const PROPLE_DID_METHOD: &str = "prople";

/// `BasicMessage` is a plain text message received over a connection
#[derive(Debug, Clone, PartialEq)]
pub struct BasicMessage {
    pub connection_id: String,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Default)]
struct AgentStore {
    connections: HashMap<String, ConnectionRecord>,
    link_secrets: Vec<String>,
    credentials: HashMap<String, CredentialExchangeRecord>,
    proofs: HashMap<String, ProofExchangeRecord>,
    inbox: Vec<BasicMessage>,
}

/// `AgentState` is shared between an agent, its peers and the handshake tasks
///
/// Methods never lock another agent's store while holding this one
pub(crate) struct AgentState {
    label: String,
    available: AtomicBool,
    events: EventBus,
    store: Mutex<AgentStore>,
}

impl AgentState {
    fn store(&self) -> MutexGuard<'_, AgentStore> {
        self.store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    fn unavailable(&self) -> String {
        format!("agent {} is shut down", self.label)
    }

    /// `apply` moves the stored copy of `record` (or `record` itself when it is not
    /// stored yet) into `state` and publishes the transition
    fn apply(&self, record: &ConnectionRecord, state: ConnectionState) -> ConnectionRecord {
        let next = {
            let store = self.store();
            store
                .connections
                .get(record.get_id())
                .unwrap_or(record)
                .transition(state)
        };

        self.save_connection(next.clone());
        next
    }

    fn save_connection(&self, record: ConnectionRecord) {
        let previous_state = self
            .store()
            .connections
            .insert(record.get_id().to_string(), record.clone())
            .map(|previous| previous.get_state());

        debug!(
            "[agent:{}] connection {} | {:?} -> {:?}",
            self.label,
            record.get_id(),
            previous_state,
            record.get_state()
        );

        self.events
            .publish(&ConnectionStateChanged::new(record, previous_state));
    }

    fn receive_credential(&self, record: CredentialExchangeRecord) {
        self.store().credentials.insert(record.id.clone(), record);
    }

    fn set_credential_state(&self, id: &str, state: CredentialState) {
        if let Some(record) = self.store().credentials.get_mut(id) {
            record.state = state;
        }
    }

    fn receive_proof(&self, record: ProofExchangeRecord) {
        self.store().proofs.insert(record.id.clone(), record);
    }

    fn verify_presentation(&self, id: &str, verified: bool) {
        if let Some(record) = self.store().proofs.get_mut(id) {
            record.state = ProofState::Done;
            record.is_verified = Some(verified);
        }
    }

    fn deliver(&self, message: BasicMessage) {
        self.store().inbox.push(message);
    }

    fn connected(&self, connection_id: &str) -> Result<ConnectionRecord, VerifiableError> {
        self.store()
            .connections
            .get(connection_id)
            .filter(|record| record.is_connected())
            .cloned()
            .ok_or_else(|| VerifiableError::NotConnected(connection_id.to_string()))
    }
}

/// `MemoryAgent` is an in-process stand-in for an external agent framework
///
/// It owns its connections, wallet, credential and proof exchanges and an inbox,
/// and talks to other agents through a [`MemoryNetwork`]. Cloning shares the
/// same agent.
#[derive(Clone)]
pub struct MemoryAgent {
    state: Arc<AgentState>,
    network: MemoryNetwork,
}

impl MemoryAgent {
    pub fn new(label: impl Into<String>, network: MemoryNetwork) -> Self {
        let state = AgentState {
            label: label.into(),
            available: AtomicBool::new(true),
            events: EventBus::new(),
            store: Mutex::new(AgentStore::default()),
        };

        Self {
            state: Arc::new(state),
            network,
        }
    }

    pub fn get_label(&self) -> String {
        self.state.label.to_owned()
    }

    pub fn is_available(&self) -> bool {
        self.state.is_available()
    }

    /// `shutdown` makes every later source call fail with a `SourceUnavailable` error
    pub fn shutdown(&self) {
        self.state.available.store(false, Ordering::Release);
        info!("[agent:shutdown] agent {} is shut down", self.state.label);
    }

    pub fn inbox(&self) -> Vec<BasicMessage> {
        self.state.store().inbox.clone()
    }

    pub fn connections(&self) -> Vec<ConnectionRecord> {
        self.state.store().connections.values().cloned().collect()
    }

    pub fn subscriptions(&self) -> usize {
        self.state.events.len()
    }

    fn ensure_available(&self) -> Result<(), String> {
        if !self.state.is_available() {
            return Err(self.state.unavailable());
        }

        Ok(())
    }
}

async fn handshake(
    step_delay: Duration,
    inviter: Arc<AgentState>,
    inviter_record: ConnectionRecord,
    invitee: Arc<AgentState>,
    invitee_record: ConnectionRecord,
) {
    let steps = [
        (true, ConnectionState::Requested),
        (true, ConnectionState::Responded),
        (false, ConnectionState::Completed),
        (true, ConnectionState::Completed),
    ];

    for (on_inviter, state) in steps {
        time::sleep(step_delay).await;

        if !inviter.is_available() || !invitee.is_available() {
            warn!(
                "[agent:handshake] stopped, agent unavailable: {}",
                inviter_record.get_correlation_id().as_str()
            );
            return;
        }

        if on_inviter {
            inviter.apply(&inviter_record, state);
        } else {
            invitee.apply(&invitee_record, state);
        }
    }

    debug!(
        "[agent:handshake] completed: {}",
        inviter_record.get_correlation_id().as_str()
    );
}

#[async_trait]
impl EventSourceBuilder for MemoryAgent {
    async fn subscribe(
        &self,
        _kind: EventKind,
        handler: EventHandler,
    ) -> Result<SubscriptionHandle, ConnectionError> {
        self.ensure_available()
            .map_err(ConnectionError::SourceUnavailable)?;

        Ok(self.state.events.register(handler))
    }

    async fn unsubscribe(&self, handle: SubscriptionHandle) -> Result<(), ConnectionError> {
        if !self.state.events.remove(handle) {
            debug!("[agent:unsubscribe] unknown handle: {}", handle.id());
        }

        Ok(())
    }
}

#[async_trait]
impl PollSourceBuilder for MemoryAgent {
    async fn find_by_correlation_id(
        &self,
        correlation_id: &CorrelationId,
    ) -> Result<Vec<ConnectionRecord>, ConnectionError> {
        self.ensure_available()
            .map_err(ConnectionError::SourceUnavailable)?;

        let records = self
            .state
            .store()
            .connections
            .values()
            .filter(|record| record.get_correlation_id() == correlation_id)
            .cloned()
            .collect();

        Ok(records)
    }
}

#[async_trait]
impl InviterBuilder for MemoryAgent {
    async fn create_invitation(
        &self,
        domain: &str,
    ) -> Result<OutOfBandInvitation, InvitationError> {
        self.ensure_available()
            .map_err(InvitationError::SourceUnavailable)?;

        let invitation = OutOfBandInvitation::new(self.get_label(), domain);
        self.network.publish_invitation(
            invitation.correlation_id().clone(),
            Arc::downgrade(&self.state),
        );

        Ok(invitation)
    }
}

#[async_trait]
impl InviteeBuilder for MemoryAgent {
    async fn receive_invitation(
        &self,
        url: &str,
    ) -> Result<Option<ConnectionRecord>, InvitationError> {
        self.ensure_available()
            .map_err(InvitationError::SourceUnavailable)?;

        let correlation_id = InvitationUrl::parse(url)?;
        let inviter = match self.network.claim_invitation(&correlation_id)? {
            Some(inviter) => inviter,
            None => {
                warn!(
                    "[agent:receive_invitation] invitation already used: {}",
                    correlation_id.as_str()
                );
                return Ok(None);
            }
        };

        let invitee_record =
            ConnectionRecord::new(correlation_id.clone(), ConnectionState::Requested)
                .with_their_label(inviter.label.to_owned());
        let inviter_record = ConnectionRecord::new(correlation_id, ConnectionState::Requested)
            .with_their_label(self.get_label());

        self.network.link(
            (inviter_record.get_id(), &inviter),
            (invitee_record.get_id(), &self.state),
        );
        self.state.save_connection(invitee_record.clone());

        tokio::spawn(handshake(
            self.network.step_delay(),
            inviter,
            inviter_record,
            self.state.clone(),
            invitee_record.clone(),
        ));

        Ok(Some(invitee_record))
    }
}

#[async_trait]
impl IssuerFrameworkBuilder for MemoryAgent {
    async fn create_did(&self, method: &str, network: &str) -> Result<String, VerifiableError> {
        self.ensure_available()
            .map_err(VerifiableError::SourceUnavailable)?;

        let did = match method {
            "" => {
                return Err(VerifiableError::CreateDIDError(
                    "missing did method".to_string(),
                ))
            }
            PROPLE_DID_METHOD => {
                let did = DID::new();
                let identity = did
                    .identity()
                    .map_err(|err| VerifiableError::CreateDIDError(err.to_string()))?;

                identity.value()
            }
            _ => format!("did:{}:{}:{}", method, network, Uuid::new_v4()),
        };

        self.network.register_did(did.clone());
        Ok(did)
    }

    async fn register_schema(
        &self,
        template: &SchemaTemplate,
    ) -> Result<SchemaState, VerifiableError> {
        self.ensure_available()
            .map_err(VerifiableError::SourceUnavailable)?;

        Ok(self.network.register_schema(template))
    }

    async fn register_credential_definition(
        &self,
        template: &CredentialDefinitionTemplate,
    ) -> Result<CredentialDefinitionState, VerifiableError> {
        self.ensure_available()
            .map_err(VerifiableError::SourceUnavailable)?;

        Ok(self.network.register_credential_definition(template))
    }

    async fn offer_credential(
        &self,
        connection_id: &str,
        offer: &CredentialOffer,
    ) -> Result<CredentialExchangeRecord, VerifiableError> {
        self.ensure_available()
            .map_err(VerifiableError::SourceUnavailable)?;
        self.state.connected(connection_id)?;

        let schema_attributes = self
            .network
            .schema_attributes(&offer.credential_definition_id)
            .ok_or_else(|| {
                VerifiableError::CredentialError(format!(
                    "unknown credential definition: {}",
                    offer.credential_definition_id
                ))
            })?;

        if let Some(unknown) = offer
            .attributes
            .iter()
            .find(|attribute| !schema_attributes.contains(&attribute.name))
        {
            return Err(VerifiableError::CredentialError(format!(
                "attribute not in schema: {}",
                unknown.name
            )));
        }

        let peer = self.network.peer(connection_id).ok_or_else(|| {
            VerifiableError::CredentialError(format!("no peer for connection: {}", connection_id))
        })?;

        if !peer.agent.is_available() {
            return Err(VerifiableError::SourceUnavailable(peer.agent.unavailable()));
        }

        let record = CredentialExchangeRecord {
            id: Uuid::new_v4().to_string(),
            connection_id: connection_id.to_string(),
            credential_definition_id: offer.credential_definition_id.to_owned(),
            attributes: offer.attributes.to_owned(),
            state: CredentialState::OfferSent,
        };

        self.state.receive_credential(record.clone());
        peer.agent.receive_credential(CredentialExchangeRecord {
            connection_id: peer.connection_id,
            state: CredentialState::OfferReceived,
            ..record.clone()
        });

        Ok(record)
    }

    async fn request_proof(
        &self,
        connection_id: &str,
        request: &ProofRequest,
    ) -> Result<ProofExchangeRecord, VerifiableError> {
        self.ensure_available()
            .map_err(VerifiableError::SourceUnavailable)?;
        self.state.connected(connection_id)?;

        let peer = self.network.peer(connection_id).ok_or_else(|| {
            VerifiableError::ProofError(format!("no peer for connection: {}", connection_id))
        })?;

        if !peer.agent.is_available() {
            return Err(VerifiableError::SourceUnavailable(peer.agent.unavailable()));
        }

        let record = ProofExchangeRecord {
            id: Uuid::new_v4().to_string(),
            connection_id: connection_id.to_string(),
            request: request.to_owned(),
            state: ProofState::RequestSent,
            is_verified: None,
        };

        self.state.receive_proof(record.clone());
        peer.agent.receive_proof(ProofExchangeRecord {
            connection_id: peer.connection_id,
            state: ProofState::RequestReceived,
            ..record.clone()
        });

        Ok(record)
    }

    async fn get_proof_record(&self, id: &str) -> Result<ProofExchangeRecord, VerifiableError> {
        self.ensure_available()
            .map_err(VerifiableError::SourceUnavailable)?;

        self.state
            .store()
            .proofs
            .get(id)
            .cloned()
            .ok_or_else(|| VerifiableError::RecordNotFound(id.to_string()))
    }
}

#[async_trait]
impl HolderFrameworkBuilder for MemoryAgent {
    async fn link_secret_ids(&self) -> Result<Vec<String>, VerifiableError> {
        self.ensure_available()
            .map_err(VerifiableError::SourceUnavailable)?;

        Ok(self.state.store().link_secrets.clone())
    }

    async fn create_link_secret(&self) -> Result<String, VerifiableError> {
        self.ensure_available()
            .map_err(VerifiableError::SourceUnavailable)?;

        let id = Uuid::new_v4().to_string();
        self.state.store().link_secrets.push(id.clone());
        Ok(id)
    }

    async fn accept_offer(
        &self,
        credential_record_id: &str,
    ) -> Result<CredentialExchangeRecord, VerifiableError> {
        self.ensure_available()
            .map_err(VerifiableError::SourceUnavailable)?;

        let accepted = {
            let mut store = self.state.store();
            if store.link_secrets.is_empty() {
                return Err(VerifiableError::CredentialError(
                    "missing link secret".to_string(),
                ));
            }

            let record = store
                .credentials
                .get_mut(credential_record_id)
                .ok_or_else(|| VerifiableError::RecordNotFound(credential_record_id.to_string()))?;

            if record.state != CredentialState::OfferReceived {
                return Err(VerifiableError::CredentialError(format!(
                    "unexpected credential state: {:?}",
                    record.state
                )));
            }

            record.state = CredentialState::Done;
            record.clone()
        };

        if let Some(peer) = self.network.peer(&accepted.connection_id) {
            peer.agent
                .set_credential_state(&accepted.id, CredentialState::Done);
        }

        Ok(accepted)
    }

    async fn select_credentials_for_request(
        &self,
        proof_record_id: &str,
    ) -> Result<SelectedCredentials, VerifiableError> {
        self.ensure_available()
            .map_err(VerifiableError::SourceUnavailable)?;

        let store = self.state.store();
        let record = store
            .proofs
            .get(proof_record_id)
            .ok_or_else(|| VerifiableError::RecordNotFound(proof_record_id.to_string()))?;

        let mut selected = SelectedCredentials::default();
        for (referent, requested) in record.request.requested_attributes.iter() {
            let credential = store
                .credentials
                .values()
                .find(|credential| {
                    satisfies(credential, &requested.name, &requested.restrictions)
                })
                .ok_or_else(|| {
                    VerifiableError::ProofError(format!(
                        "no credential for requested attribute: {}",
                        referent
                    ))
                })?;

            selected
                .attributes
                .insert(referent.to_owned(), credential.id.to_owned());
        }

        Ok(selected)
    }

    async fn accept_request(
        &self,
        proof_record_id: &str,
        selected: &SelectedCredentials,
    ) -> Result<ProofExchangeRecord, VerifiableError> {
        self.ensure_available()
            .map_err(VerifiableError::SourceUnavailable)?;

        let (presented, verified) = {
            let mut store = self.state.store();
            let record = store
                .proofs
                .get(proof_record_id)
                .cloned()
                .ok_or_else(|| VerifiableError::RecordNotFound(proof_record_id.to_string()))?;

            if record.state != ProofState::RequestReceived {
                return Err(VerifiableError::ProofError(format!(
                    "unexpected proof state: {:?}",
                    record.state
                )));
            }

            let mut verified = true;
            for (referent, requested) in record.request.requested_attributes.iter() {
                let credential_id = selected.attributes.get(referent).ok_or_else(|| {
                    VerifiableError::ProofError(format!("missing selection: {}", referent))
                })?;

                verified &= store
                    .credentials
                    .get(credential_id)
                    .map(|credential| {
                        satisfies(credential, &requested.name, &requested.restrictions)
                    })
                    .unwrap_or(false);
            }

            let presented = ProofExchangeRecord {
                state: ProofState::PresentationSent,
                ..record
            };
            store.proofs.insert(presented.id.clone(), presented.clone());
            (presented, verified)
        };

        let peer = self.network.peer(&presented.connection_id).ok_or_else(|| {
            VerifiableError::ProofError(format!(
                "no peer for connection: {}",
                presented.connection_id
            ))
        })?;
        peer.agent.verify_presentation(&presented.id, verified);

        let done = ProofExchangeRecord {
            state: ProofState::Done,
            ..presented
        };
        self.state.receive_proof(done.clone());

        Ok(done)
    }
}

#[async_trait]
impl MessengerBuilder for MemoryAgent {
    async fn send_message(
        &self,
        connection_id: &str,
        message: &str,
    ) -> Result<(), VerifiableError> {
        self.ensure_available()
            .map_err(VerifiableError::SourceUnavailable)?;
        self.state.connected(connection_id)?;

        let peer = self.network.peer(connection_id).ok_or_else(|| {
            VerifiableError::MessageError(format!("no peer for connection: {}", connection_id))
        })?;

        if !peer.agent.is_available() {
            return Err(VerifiableError::MessageError(peer.agent.unavailable()));
        }

        peer.agent.deliver(BasicMessage {
            connection_id: peer.connection_id,
            content: message.to_string(),
            sent_at: Utc::now(),
        });

        Ok(())
    }
}

fn satisfies(credential: &CredentialExchangeRecord, attribute: &str, restrictions: &[String]) -> bool {
    credential.state == CredentialState::Done
        && (restrictions.is_empty() || restrictions.contains(&credential.credential_definition_id))
        && credential
            .attributes
            .iter()
            .any(|candidate| candidate.name == attribute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use prople_agent_core::identity::verifiable::types::CredentialAttribute;

    const STEP: Duration = Duration::from_millis(5);

    fn agents() -> (MemoryAgent, MemoryAgent) {
        let network = MemoryNetwork::new(STEP);
        (
            MemoryAgent::new("faber", network.clone()),
            MemoryAgent::new("alice", network),
        )
    }

    async fn connected(
        issuer: &MemoryAgent,
        holder: &MemoryAgent,
    ) -> (ConnectionRecord, ConnectionRecord) {
        let invitation = issuer
            .create_invitation("http://localhost:3002")
            .await
            .unwrap();
        let invitee = holder
            .receive_invitation(invitation.get_url())
            .await
            .unwrap()
            .unwrap();

        time::sleep(STEP * 10).await;

        let inviter = issuer
            .find_by_correlation_id(invitation.correlation_id())
            .await
            .unwrap()
            .remove(0);
        let invitee = holder
            .connections()
            .into_iter()
            .find(|record| record.get_id() == invitee.get_id())
            .unwrap();

        (inviter, invitee)
    }

    async fn credential_definition(issuer: &MemoryAgent) -> String {
        let did = issuer.create_did("prople", "testnet").await.unwrap();
        let schema_id = match issuer
            .register_schema(&SchemaTemplate {
                attr_names: vec!["name".to_string(), "age".to_string()],
                issuer_id: did.clone(),
                name: "Example Schema to register".to_string(),
                version: "1.0.0".to_string(),
            })
            .await
            .unwrap()
        {
            SchemaState::Finished { schema_id } => schema_id,
            SchemaState::Failed { reason } => panic!("schema failed: {}", reason),
        };

        match issuer
            .register_credential_definition(&CredentialDefinitionTemplate {
                schema_id,
                issuer_id: did,
                tag: "latest".to_string(),
            })
            .await
            .unwrap()
        {
            CredentialDefinitionState::Finished {
                credential_definition_id,
            } => credential_definition_id,
            _ => panic!("credential definition not finished"),
        }
    }

    #[tokio::test]
    async fn test_handshake_publishes_transitions() {
        let (issuer, holder) = agents();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let collector = seen.clone();
        let handle = issuer
            .subscribe(
                EventKind::ConnectionStateChanged,
                Arc::new(move |event: &ConnectionStateChanged| {
                    collector
                        .lock()
                        .unwrap()
                        .push((event.previous_state, event.connection_record.get_state()));
                }),
            )
            .await
            .unwrap();

        let (inviter, invitee) = connected(&issuer, &holder).await;
        assert!(inviter.is_connected());
        assert!(invitee.is_connected());
        assert_eq!(inviter.get_their_label(), Some(&"alice".to_string()));
        assert_eq!(invitee.get_their_label(), Some(&"faber".to_string()));
        assert_eq!(inviter.get_correlation_id(), invitee.get_correlation_id());

        let transitions = seen.lock().unwrap().clone();
        assert_eq!(
            transitions,
            vec![
                (None, ConnectionState::Requested),
                (Some(ConnectionState::Requested), ConnectionState::Responded),
                (Some(ConnectionState::Responded), ConnectionState::Completed),
            ]
        );

        let _ = issuer.unsubscribe(handle).await;
        assert_eq!(issuer.subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_invitation_used_once() {
        let (issuer, holder) = agents();
        let invitation = issuer
            .create_invitation("http://localhost:3002")
            .await
            .unwrap();

        let first = holder.receive_invitation(invitation.get_url()).await;
        assert!(matches!(first, Ok(Some(_))));

        let second = holder.receive_invitation(invitation.get_url()).await;
        assert!(matches!(second, Ok(None)));

        let unknown = holder
            .receive_invitation("http://localhost:3002?oob=unknown")
            .await;
        assert!(matches!(
            unknown,
            Err(InvitationError::InvitationNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_shutdown_sources_unavailable() {
        let (issuer, _) = agents();
        issuer.shutdown();
        assert!(!issuer.is_available());

        let polled = issuer
            .find_by_correlation_id(&CorrelationId::from("inv-1"))
            .await;
        assert!(matches!(polled, Err(ConnectionError::SourceUnavailable(_))));

        let subscribed = issuer
            .subscribe(
                EventKind::ConnectionStateChanged,
                Arc::new(|_: &ConnectionStateChanged| {}),
            )
            .await;
        assert!(matches!(
            subscribed,
            Err(ConnectionError::SourceUnavailable(_))
        ));

        let invitation = issuer.create_invitation("http://localhost:3002").await;
        assert!(matches!(
            invitation,
            Err(InvitationError::SourceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_shutdown_stops_handshake() {
        let (issuer, holder) = agents();
        let invitation = issuer
            .create_invitation("http://localhost:3002")
            .await
            .unwrap();

        let _ = holder.receive_invitation(invitation.get_url()).await;
        issuer.shutdown();
        time::sleep(STEP * 10).await;

        assert!(issuer.connections().is_empty());
        assert!(holder
            .connections()
            .iter()
            .all(|record| !record.is_connected()));
    }

    #[tokio::test]
    async fn test_create_did_methods() {
        let (issuer, _) = agents();

        let did = issuer.create_did("cheqd", "testnet").await.unwrap();
        assert!(did.starts_with("did:cheqd:testnet:"));

        let did = issuer.create_did("prople", "testnet").await.unwrap();
        assert!(did.starts_with("did:"));

        let missing = issuer.create_did("", "testnet").await;
        assert!(matches!(missing, Err(VerifiableError::CreateDIDError(_))));
    }

    #[tokio::test]
    async fn test_credential_proof_and_message_exchange() {
        let (issuer, holder) = agents();
        let (inviter, invitee) = connected(&issuer, &holder).await;
        let credential_definition_id = credential_definition(&issuer).await;

        let offered = issuer
            .offer_credential(
                inviter.get_id(),
                &CredentialOffer {
                    credential_definition_id: credential_definition_id.clone(),
                    attributes: vec![
                        CredentialAttribute::new("name", "Jane Doe"),
                        CredentialAttribute::new("age", "23"),
                    ],
                },
            )
            .await
            .unwrap();
        assert_eq!(offered.state, CredentialState::OfferSent);

        let without_secret = holder.accept_offer(&offered.id).await;
        assert!(matches!(
            without_secret,
            Err(VerifiableError::CredentialError(_))
        ));

        let _ = holder.create_link_secret().await.unwrap();
        let accepted = holder.accept_offer(&offered.id).await.unwrap();
        assert_eq!(accepted.state, CredentialState::Done);
        assert_eq!(accepted.connection_id, invitee.get_id());

        let requested = issuer
            .request_proof(
                inviter.get_id(),
                &ProofRequest::restricted_to("name", &credential_definition_id),
            )
            .await
            .unwrap();

        let selected = holder
            .select_credentials_for_request(&requested.id)
            .await
            .unwrap();
        assert_eq!(selected.attributes.get("name"), Some(&offered.id));

        let presented = holder.accept_request(&requested.id, &selected).await.unwrap();
        assert_eq!(presented.state, ProofState::Done);

        let verified = issuer.get_proof_record(&requested.id).await.unwrap();
        assert_eq!(verified.state, ProofState::Done);
        assert_eq!(verified.is_verified, Some(true));

        issuer
            .send_message(inviter.get_id(), "Hello from faber")
            .await
            .unwrap();
        let inbox = holder.inbox();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].content, "Hello from faber");
        assert_eq!(inbox[0].connection_id, invitee.get_id());
    }

    #[tokio::test]
    async fn test_offer_rejects_unknown_attribute() {
        let (issuer, holder) = agents();
        let (inviter, _) = connected(&issuer, &holder).await;
        let credential_definition_id = credential_definition(&issuer).await;

        let offered = issuer
            .offer_credential(
                inviter.get_id(),
                &CredentialOffer {
                    credential_definition_id,
                    attributes: vec![CredentialAttribute::new("email", "jane@example.org")],
                },
            )
            .await;
        assert!(matches!(offered, Err(VerifiableError::CredentialError(_))));
    }

    #[tokio::test]
    async fn test_message_requires_connection() {
        let (issuer, _) = agents();
        let sent = issuer.send_message("unknown", "hello").await;
        assert!(matches!(sent, Err(VerifiableError::NotConnected(_))));
    }
}
