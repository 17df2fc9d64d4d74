use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use prople_agent_core::identity::connection::types::{
    ConnectionStateChanged, EventHandler, SubscriptionHandle,
};

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: HashMap<u64, EventHandler>,
}

/// `EventBus` is the in-process callback registry of a simulated agent
///
/// Handlers are invoked while the registry lock is held. Once [`EventBus::remove`]
/// returned, the removed handler is never invoked again, which is what the
/// rendezvous expects from an event source. A handler must not touch the bus it
/// is registered to.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn register(&self, handler: EventHandler) -> SubscriptionHandle {
        let mut registry = self.registry();
        registry.next_id += 1;

        let id = registry.next_id;
        registry.handlers.insert(id, handler);
        SubscriptionHandle::new(id)
    }

    /// `remove` returns false when the handle was never registered or already removed
    pub fn remove(&self, handle: SubscriptionHandle) -> bool {
        self.registry().handlers.remove(&handle.id()).is_some()
    }

    pub fn publish(&self, event: &ConnectionStateChanged) {
        let registry = self.registry();
        for handler in registry.handlers.values() {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.registry().handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
