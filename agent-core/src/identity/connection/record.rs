use rst_common::standard::chrono::serde::ts_seconds;
use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json;
use rst_common::standard::uuid::Uuid;

use rstdev_domain::entity::ToJSON;
use rstdev_domain::BaseError;

use super::types::{ConnectionError, ConnectionState, CorrelationId};

/// `ConnectionRecord` is the connection entity owned by the agent framework
///
/// The rendezvous only reads it. The `correlation_id` is the out-of-band
/// invitation id the record was created from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct ConnectionRecord {
    id: String,
    correlation_id: CorrelationId,
    state: ConnectionState,
    their_label: Option<String>,

    #[serde(with = "ts_seconds")]
    created_at: DateTime<Utc>,

    #[serde(with = "ts_seconds")]
    updated_at: DateTime<Utc>,
}

impl ConnectionRecord {
    pub fn new(correlation_id: CorrelationId, state: ConnectionState) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            correlation_id,
            state,
            their_label: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_their_label(mut self, label: impl Into<String>) -> Self {
        self.their_label = Some(label.into());
        self
    }

    /// `transition` returns a copy of the record moved into the given state
    pub fn transition(&self, state: ConnectionState) -> Self {
        let mut next = self.clone();
        next.state = state;
        next.updated_at = Utc::now();
        next
    }

    pub fn get_id(&self) -> &str {
        &self.id
    }

    pub fn get_correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    pub fn get_state(&self) -> ConnectionState {
        self.state
    }

    pub fn get_their_label(&self) -> Option<&String> {
        self.their_label.as_ref()
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn get_updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }
}

impl ToJSON for ConnectionRecord {
    fn to_json(&self) -> Result<String, BaseError> {
        serde_json::to_string(self).map_err(|err| BaseError::ToJSONError(err.to_string()))
    }
}

impl TryFrom<Vec<u8>> for ConnectionRecord {
    type Error = ConnectionError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        serde_json::from_slice(&value).map_err(|err| ConnectionError::EntityError(err.to_string()))
    }
}
