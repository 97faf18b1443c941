//! Core of the router gateway.
//!
//! The [`Gateway`] owns the router registry and the fee policy, consults the
//! authorization and pause gates, and settles every operation on the asset
//! ledger. Trades and liquidity operations are routed to whichever registered
//! endpoint quotes the best output.

pub mod access;
pub mod admin;
pub mod aggregator;
pub mod builder;
pub mod error;
pub mod fees;
pub mod gateway;
pub mod liquidity;
pub mod swap;

pub use access::{AuthorizationGate, FlagPauseGate, OwnerGate, PauseGate};
pub use aggregator::QuoteAggregator;
pub use builder::{BuildError, BuiltGateway, GatewayBuilder};
pub use error::{ErrorKind, GatewayError};
pub use fees::{compute_fee, FeeEngine, FeeSplit};
pub use gateway::{Gateway, GatewayOptions};
pub use liquidity::{split_for_zap, AddLiquidity, RemoveLiquidity, ZapSplit};
