use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use derive_more::{AsRef, From, Into};
use the_newtype::Newtype;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::with_errors::thiserror::{self, Error};

use super::record::ConnectionRecord;

/// ConnectionError is a base error types for the `Connection` domain
///
/// It covers both the connection record itself and the rendezvous used
/// to wait for a connection to reach a target state
#[derive(Debug, PartialEq, Error, Clone)]
pub enum ConnectionError {
    #[error("invalid correlation id: {0}")]
    InvalidCorrelationId(String),

    #[error("rendezvous timeout: correlation_id: {correlation_id}, waited: {waited:?}")]
    Timeout {
        correlation_id: String,
        waited: Duration,
    },

    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("entity error: {0}")]
    EntityError(String),

    #[error("unknown error: {0}")]
    UnknownError(String),
}

/// `CorrelationId` ties an out-of-band invitation to the connection record it
/// eventually produces
///
/// The value is opaque, the only validation applied is that it must not be empty
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Newtype, From, Into, AsRef)]
#[serde(crate = "self::serde")]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for CorrelationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// State represent the connection handshake states as reported by the agent framework
///
/// A fresh invitation starts from [`ConnectionState::Invited`], the handshake moves it through
/// [`ConnectionState::Requested`] and [`ConnectionState::Responded`] until it reaches
/// [`ConnectionState::Completed`]. A handshake that is given up ends in [`ConnectionState::Abandoned`]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(crate = "self::serde")]
pub enum ConnectionState {
    Invited,
    Requested,
    Responded,
    Completed,
    Abandoned,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Completed)
    }
}

/// `EventKind` scopes a subscription on the [`EventSourceBuilder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ConnectionStateChanged,
}

/// `ConnectionStateChanged` is published by the agent framework each time a
/// connection record moves to another state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct ConnectionStateChanged {
    pub connection_record: ConnectionRecord,
    pub previous_state: Option<ConnectionState>,
}

impl ConnectionStateChanged {
    pub fn new(connection_record: ConnectionRecord, previous_state: Option<ConnectionState>) -> Self {
        Self {
            connection_record,
            previous_state,
        }
    }
}

/// `SubscriptionHandle` is returned by [`EventSourceBuilder::subscribe`] and is the
/// only way to remove the registered handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// `EventHandler` is the callback registered to the event source
///
/// It is invoked synchronously by the publisher, so it must never block
pub type EventHandler = Arc<dyn Fn(&ConnectionStateChanged) + Send + Sync>;

/// `Predicate` decides whether a connection record satisfies a rendezvous
pub type Predicate = Arc<dyn Fn(&ConnectionRecord) -> bool + Send + Sync>;

/// Default rendezvous predicate, a record is accepted once it is connected
pub fn is_connected(record: &ConnectionRecord) -> bool {
    record.get_state().is_connected()
}

/// `in_state` builds a predicate accepting records on the given state only
pub fn in_state(state: ConnectionState) -> Predicate {
    Arc::new(move |record: &ConnectionRecord| record.get_state() == state)
}

/// `EventSourceBuilder` is the publish side of the external agent framework
///
/// The framework announces connection transitions to every registered handler. The
/// event source is shared process-wide, filtering per correlation id is the
/// subscriber's job.
///
/// Once `unsubscribe` returns, the implementer must guarantee the handler will
/// never be invoked again
#[async_trait]
pub trait EventSourceBuilder: Clone + Send + Sync {
    async fn subscribe(
        &self,
        kind: EventKind,
        handler: EventHandler,
    ) -> Result<SubscriptionHandle, ConnectionError>;

    async fn unsubscribe(&self, handle: SubscriptionHandle) -> Result<(), ConnectionError>;
}

/// `PollSourceBuilder` is the query side of the external agent framework
///
/// It covers the race where a transition already happened before any handler was
/// attached
#[async_trait]
pub trait PollSourceBuilder: Clone + Send + Sync {
    async fn find_by_correlation_id(
        &self,
        correlation_id: &CorrelationId,
    ) -> Result<Vec<ConnectionRecord>, ConnectionError>;
}
