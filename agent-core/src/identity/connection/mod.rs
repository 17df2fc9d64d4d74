//! # Connection Module
//!
//! Connection records are owned by the external agent framework. This module models
//! the part of them the demo reads, the two ways the framework exposes them (pushed
//! events and polled lookups), and the [`rendezvous::Rendezvous`] coordinator used
//! to wait until a handshake started by an out-of-band invitation is completed.
//!
//! - [`types`] - correlation id, connection states, events, source traits and errors
//! - [`record`] - the [`record::ConnectionRecord`] entity
//! - [`rendezvous`] - the first-wins wait over events, poll and deadline
pub mod record;
pub mod rendezvous;
pub mod types;

pub use record::ConnectionRecord;
pub use rendezvous::{Rendezvous, RendezvousConfig};
