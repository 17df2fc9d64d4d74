//! `prople-agent-core` holds the domain of the agent demo
//!
//! The agent framework itself (DIDs, wallets, anoncreds, transports) is an external
//! collaborator, this crate only models what the demo needs from it as traits, plus
//! the one piece owned here: the connection [`identity::connection::rendezvous`].
pub mod identity;
