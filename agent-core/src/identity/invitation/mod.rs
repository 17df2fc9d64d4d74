//! # Invitation Module
//!
//! Out-of-band invitations bracket the connection rendezvous. The inviter produces
//! the correlation id before waiting, the invitee independently accepts the shared
//! url which triggers the framework's handshake.
pub mod types;
pub mod usecase;

pub use types::{InvitationUrl, OutOfBandInvitation};
pub use usecase::Usecase;
