//! Shared types for the router gateway.
//!
//! Primitive identities and amounts, the event model and its bus, the wire
//! models used by the HTTP API and the configuration schema machinery used to
//! validate implementation-specific TOML tables.

pub mod api;
pub mod common;
pub mod events;
pub mod quote;
pub mod validation;

pub use api::*;
pub use common::*;
pub use events::*;
pub use quote::*;
pub use validation::*;
