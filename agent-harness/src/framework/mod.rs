//! In-memory agent framework used by the demo
//!
//! Two [`MemoryAgent`] instances sharing a [`MemoryNetwork`] can exchange
//! invitations, run a simulated connection handshake, and then go through the
//! credential, proof and basic message flows
pub mod agent;
pub mod events;
pub mod network;

pub use agent::{BasicMessage, MemoryAgent};
pub use events::EventBus;
pub use network::MemoryNetwork;
