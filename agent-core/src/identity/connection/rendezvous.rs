//! # Rendezvous
//!
//! After an invitation has been issued the inviter must learn, within a bounded
//! time, that the counterparty completed the connection handshake. Two signals can
//! tell it so:
//!
//! - a pushed [`ConnectionStateChanged`] event from the [`EventSourceBuilder`]
//! - a polled record from the [`PollSourceBuilder`], covering transitions that
//!   happened before the handler was attached
//!
//! A deadline competes with both. [`Rendezvous::await_connection`] folds the three
//! triggers into a single outcome: every trigger goes through one atomic settle
//! point on the [`PendingRendezvous`], the first one wins and all later triggers
//! are ignored. The subscription is always released before the call returns.
//!
//! ```text
//! subscribe ──► poll once ──► wait(receiver | deadline) ──► unsubscribe ──► outcome
//!     │              │                   │
//!     └── event ─────┴──── try_settle ◄──┘  (first wins)
//! ```
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rst_common::with_logging::log::{debug, warn};
use rst_common::with_tokio::tokio;
use rst_common::with_tokio::tokio::sync::oneshot;
use rst_common::with_tokio::tokio::time::{self, Instant};

use super::record::ConnectionRecord;
use super::types::{
    is_connected, ConnectionError, ConnectionStateChanged, CorrelationId, EventHandler, EventKind,
    EventSourceBuilder, PollSourceBuilder, Predicate, SubscriptionHandle,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

type Outcome = Result<ConnectionRecord, ConnectionError>;

/// `RendezvousConfig` holds the default wait used by [`Rendezvous::await_connected`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendezvousConfig {
    timeout: Duration,
}

impl RendezvousConfig {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn get_timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for RendezvousConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// `PendingRendezvous` lives for exactly one `await_connection` call
///
/// `settled` flips once. Whoever flips it owns the sender and delivers the outcome,
/// every other trigger becomes a no-op
pub(crate) struct PendingRendezvous {
    correlation_id: CorrelationId,
    started_at: Instant,
    deadline: Option<Instant>,
    settled: AtomicBool,
    sender: Mutex<Option<oneshot::Sender<Outcome>>>,
}

impl PendingRendezvous {
    /// A `timeout` too large to be represented as an instant means no deadline at all
    pub(crate) fn new(
        correlation_id: CorrelationId,
        timeout: Duration,
    ) -> (Arc<Self>, oneshot::Receiver<Outcome>) {
        let (sender, receiver) = oneshot::channel();
        let started_at = Instant::now();

        let pending = Self {
            correlation_id,
            started_at,
            deadline: started_at.checked_add(timeout),
            settled: AtomicBool::new(false),
            sender: Mutex::new(Some(sender)),
        };

        (Arc::new(pending), receiver)
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.settled.load(Ordering::Acquire)
    }

    pub(crate) fn try_settle(&self, outcome: Outcome) -> bool {
        if self
            .settled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let mut sender = self
            .sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(tx) = sender.take() {
            // the receiver is gone only when the caller dropped the wait
            let _ = tx.send(outcome);
        }

        true
    }

    /// `offer` settles with the given record when it belongs to this rendezvous and
    /// satisfies the predicate
    pub(crate) fn offer(&self, record: &ConnectionRecord, predicate: &Predicate) -> bool {
        if self.is_settled() {
            return false;
        }

        if record.get_correlation_id() != &self.correlation_id || !predicate(record) {
            return false;
        }

        self.try_settle(Ok(record.clone()))
    }

    fn abandon(&self) {
        self.settled.store(true, Ordering::Release);
    }

    fn timeout_error(&self) -> ConnectionError {
        ConnectionError::Timeout {
            correlation_id: self.correlation_id.as_str().to_string(),
            waited: self.started_at.elapsed(),
        }
    }
}

/// `Subscription` owns a registered handler until it is released
///
/// When the wait is dropped before completion (the caller gave up on the future),
/// the handler is made inert and the unsubscribe is handed to the runtime
struct Subscription<'a, TEvents>
where
    TEvents: EventSourceBuilder + 'static,
{
    events: &'a TEvents,
    pending: Arc<PendingRendezvous>,
    handle: Option<SubscriptionHandle>,
}

impl<'a, TEvents> Subscription<'a, TEvents>
where
    TEvents: EventSourceBuilder + 'static,
{
    async fn release(mut self) -> Result<(), ConnectionError> {
        match self.handle.take() {
            Some(handle) => self.events.unsubscribe(handle).await,
            None => Ok(()),
        }
    }
}

impl<'a, TEvents> Drop for Subscription<'a, TEvents>
where
    TEvents: EventSourceBuilder + 'static,
{
    fn drop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        self.pending.abandon();
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let events = self.events.clone();
            runtime.spawn(async move {
                if let Err(err) = events.unsubscribe(handle).await {
                    warn!("[rendezvous:drop] unable to unsubscribe: {}", err);
                }
            });
        }
    }
}

/// `Rendezvous` is the connection establishment coordinator
///
/// It holds no state between calls, concurrent calls are independent of each other.
/// Two calls using the same correlation id are not deduplicated
#[derive(Clone)]
pub struct Rendezvous<TEvents, TPoll>
where
    TEvents: EventSourceBuilder + 'static,
    TPoll: PollSourceBuilder,
{
    events: TEvents,
    poll: TPoll,
    config: RendezvousConfig,
}

impl<TEvents, TPoll> Rendezvous<TEvents, TPoll>
where
    TEvents: EventSourceBuilder + 'static,
    TPoll: PollSourceBuilder,
{
    pub fn new(events: TEvents, poll: TPoll, config: RendezvousConfig) -> Self {
        Self {
            events,
            poll,
            config,
        }
    }

    pub fn config(&self) -> RendezvousConfig {
        self.config
    }

    /// `await_connected` waits with the configured timeout until the record is connected
    pub async fn await_connected(
        &self,
        correlation_id: &CorrelationId,
    ) -> Result<ConnectionRecord, ConnectionError> {
        self.await_connection(correlation_id, self.config.timeout, Arc::new(is_connected))
            .await
    }

    /// `await_connection` returns the first connection record for `correlation_id`
    /// satisfying `predicate`, or [`ConnectionError::Timeout`] once `timeout` elapsed
    ///
    /// The handler is subscribed before the poll is issued, so a transition landing
    /// in between is seen by at least one of them. Seeing it twice is harmless, the
    /// outcome settles once.
    ///
    /// Errors:
    /// - [`ConnectionError::InvalidCorrelationId`] before anything is subscribed
    /// - the event source or poll source error, propagated as is
    /// - [`ConnectionError::Timeout`] when no trigger satisfied the predicate in time
    pub async fn await_connection(
        &self,
        correlation_id: &CorrelationId,
        timeout: Duration,
        predicate: Predicate,
    ) -> Result<ConnectionRecord, ConnectionError> {
        if correlation_id.is_empty() {
            return Err(ConnectionError::InvalidCorrelationId(
                "correlation id must not be empty".to_string(),
            ));
        }

        let (pending, receiver) = PendingRendezvous::new(correlation_id.clone(), timeout);
        let handler = build_handler(pending.clone(), predicate.clone());

        let handle = self
            .events
            .subscribe(EventKind::ConnectionStateChanged, handler)
            .await?;

        debug!(
            "[rendezvous:await_connection] subscribed: correlation_id: {} | handle: {}",
            correlation_id.as_str(),
            handle.id()
        );

        let subscription = Subscription {
            events: &self.events,
            pending: pending.clone(),
            handle: Some(handle),
        };

        match self.poll.find_by_correlation_id(correlation_id).await {
            Ok(records) => {
                if let Some(record) = records.first() {
                    if pending.offer(record, &predicate) {
                        debug!(
                            "[rendezvous:await_connection] settled by poll: {}",
                            correlation_id.as_str()
                        );
                    }
                }
            }
            Err(err) => {
                if !pending.try_settle(Err(err.clone())) {
                    warn!(
                        "[rendezvous:await_connection] poll failed after settlement: {}",
                        err
                    );
                }
            }
        }

        let outcome = wait(&pending, receiver).await;

        if let Err(err) = subscription.release().await {
            warn!(
                "[rendezvous:await_connection] unable to unsubscribe: correlation_id: {} | err: {}",
                correlation_id.as_str(),
                err
            );
        }

        outcome
    }
}

fn build_handler(pending: Arc<PendingRendezvous>, predicate: Predicate) -> EventHandler {
    Arc::new(move |event: &ConnectionStateChanged| {
        if pending.offer(&event.connection_record, &predicate) {
            debug!(
                "[rendezvous:handler] settled by event: {}",
                event.connection_record.get_correlation_id().as_str()
            );
        }
    })
}

async fn wait(pending: &PendingRendezvous, mut receiver: oneshot::Receiver<Outcome>) -> Outcome {
    let received = match pending.deadline {
        Some(deadline) => match time::timeout_at(deadline, &mut receiver).await {
            Ok(received) => received,
            Err(_) => {
                if pending.try_settle(Err(pending.timeout_error())) {
                    debug!(
                        "[rendezvous:wait] deadline reached: {}",
                        pending.correlation_id.as_str()
                    );
                }

                // either the timeout or a trigger that won right before it
                receiver.await
            }
        },
        None => receiver.await,
    };

    match received {
        Ok(outcome) => outcome,
        Err(err) => Err(ConnectionError::UnknownError(err.to_string())),
    }
}
