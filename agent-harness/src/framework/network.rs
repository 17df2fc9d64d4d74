use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use rst_common::with_logging::log::debug;

use prople_agent_core::identity::connection::types::CorrelationId;
use prople_agent_core::identity::invitation::types::InvitationError;
use prople_agent_core::identity::verifiable::types::{
    CredentialDefinitionState, CredentialDefinitionTemplate, SchemaState, SchemaTemplate,
};

use super::agent::AgentState;

struct InvitationEntry {
    inviter: Weak<AgentState>,
    consumed: bool,
}

/// `Peer` is the other end of an established link, seen from one connection id
pub(crate) struct Peer {
    pub(crate) agent: Arc<AgentState>,
    pub(crate) connection_id: String,
}

#[derive(Default)]
struct Ledger {
    dids: HashSet<String>,
    schemas: HashMap<String, SchemaTemplate>,
    credential_definitions: HashMap<String, CredentialDefinitionTemplate>,
}

struct NetworkState {
    step_delay: Duration,
    ledger: Mutex<Ledger>,
    invitations: Mutex<HashMap<CorrelationId, InvitationEntry>>,
    links: Mutex<HashMap<String, (Weak<AgentState>, String)>>,
}

/// `MemoryNetwork` connects simulated agents living in the same process
///
/// It plays the role of the transport (invitations and links between connection
/// records) and of the verifiable data registry (DIDs, schemas, credential
/// definitions). Agents are only weakly referenced.
#[derive(Clone)]
pub struct MemoryNetwork {
    state: Arc<NetworkState>,
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryNetwork {
    pub fn new(step_delay: Duration) -> Self {
        let state = NetworkState {
            step_delay,
            ledger: Mutex::new(Ledger::default()),
            invitations: Mutex::new(HashMap::new()),
            links: Mutex::new(HashMap::new()),
        };

        Self {
            state: Arc::new(state),
        }
    }

    /// `step_delay` is the time between two simulated handshake transitions
    pub fn step_delay(&self) -> Duration {
        self.state.step_delay
    }

    pub fn has_did(&self, did: &str) -> bool {
        guard(&self.state.ledger).dids.contains(did)
    }

    pub(crate) fn register_did(&self, did: String) {
        debug!("[network:register_did] {}", did);
        guard(&self.state.ledger).dids.insert(did);
    }

    pub(crate) fn register_schema(&self, template: &SchemaTemplate) -> SchemaState {
        let mut ledger = guard(&self.state.ledger);
        if !ledger.dids.contains(&template.issuer_id) {
            return SchemaState::Failed {
                reason: format!("unknown issuer: {}", template.issuer_id),
            };
        }

        if template.attr_names.is_empty() {
            return SchemaState::Failed {
                reason: "schema without attributes".to_string(),
            };
        }

        let schema_id = format!(
            "{}/anoncreds/v0/SCHEMA/{}/{}",
            template.issuer_id, template.name, template.version
        );

        ledger.schemas.insert(schema_id.clone(), template.clone());
        SchemaState::Finished { schema_id }
    }

    pub(crate) fn register_credential_definition(
        &self,
        template: &CredentialDefinitionTemplate,
    ) -> CredentialDefinitionState {
        let mut ledger = guard(&self.state.ledger);
        if !ledger.dids.contains(&template.issuer_id) {
            return CredentialDefinitionState::Failed {
                reason: format!("unknown issuer: {}", template.issuer_id),
            };
        }

        if !ledger.schemas.contains_key(&template.schema_id) {
            return CredentialDefinitionState::Failed {
                reason: format!("unknown schema: {}", template.schema_id),
            };
        }

        let credential_definition_id = format!(
            "{}/anoncreds/v0/CLAIM_DEF/{}/{}",
            template.issuer_id,
            ledger.credential_definitions.len() + 1,
            template.tag
        );

        ledger
            .credential_definitions
            .insert(credential_definition_id.clone(), template.clone());

        CredentialDefinitionState::Finished {
            credential_definition_id,
        }
    }

    /// `schema_attributes` returns the attributes of the schema a credential definition
    /// was registered for
    pub(crate) fn schema_attributes(&self, credential_definition_id: &str) -> Option<Vec<String>> {
        let ledger = guard(&self.state.ledger);
        ledger
            .credential_definitions
            .get(credential_definition_id)
            .and_then(|definition| ledger.schemas.get(&definition.schema_id))
            .map(|schema| schema.attr_names.clone())
    }

    pub(crate) fn publish_invitation(&self, id: CorrelationId, inviter: Weak<AgentState>) {
        guard(&self.state.invitations).insert(
            id,
            InvitationEntry {
                inviter,
                consumed: false,
            },
        );
    }

    /// `claim_invitation` hands the inviter out once, a consumed invitation yields `None`
    pub(crate) fn claim_invitation(
        &self,
        id: &CorrelationId,
    ) -> Result<Option<Arc<AgentState>>, InvitationError> {
        let mut invitations = guard(&self.state.invitations);
        let entry = invitations
            .get_mut(id)
            .ok_or_else(|| InvitationError::InvitationNotFound(id.as_str().to_string()))?;

        if entry.consumed {
            return Ok(None);
        }

        let inviter = entry
            .inviter
            .upgrade()
            .ok_or_else(|| InvitationError::InvitationNotFound(id.as_str().to_string()))?;

        entry.consumed = true;
        Ok(Some(inviter))
    }

    pub(crate) fn link(
        &self,
        (first_id, first): (&str, &Arc<AgentState>),
        (second_id, second): (&str, &Arc<AgentState>),
    ) {
        let mut links = guard(&self.state.links);
        links.insert(
            first_id.to_string(),
            (Arc::downgrade(second), second_id.to_string()),
        );
        links.insert(
            second_id.to_string(),
            (Arc::downgrade(first), first_id.to_string()),
        );
    }

    pub(crate) fn peer(&self, connection_id: &str) -> Option<Peer> {
        let links = guard(&self.state.links);
        let (agent, peer_connection_id) = links.get(connection_id)?;

        agent.upgrade().map(|agent| Peer {
            agent,
            connection_id: peer_connection_id.to_owned(),
        })
    }
}
