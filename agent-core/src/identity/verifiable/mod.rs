//! # Verifiable Module
//!
//! Schema, credential definition, credential and proof flows are delegated to the
//! external agent framework. [`issuer::Issuer`] and [`holder::Holder`] keep the demo's
//! pass-through rules in one place: state checks on registration results, link secret
//! bootstrapping, and refusing connection scoped operations on connections that are
//! not established yet.
pub mod holder;
pub mod issuer;
pub mod types;

pub use holder::Holder;
pub use issuer::Issuer;
