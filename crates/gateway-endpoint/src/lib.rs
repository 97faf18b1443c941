//! Liquidity endpoint module for the router gateway.
//!
//! A liquidity endpoint is an external routing service that can price an
//! exchange along an asset path, execute it, and deposit or withdraw paired
//! liquidity. Every whitelisted endpoint implements [`EndpointInterface`];
//! the gateway never depends on a concrete backend.

use async_trait::async_trait;
use gateway_ledger::LedgerError;
use gateway_types::{Address, Timestamp, U256};
use std::sync::Arc;
use thiserror::Error;

pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use types::*;

/// Re-export implementations
pub mod implementations {
	pub mod constant_product;
}

/// Errors that can occur inside a liquidity endpoint.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EndpointError {
	#[error("Invalid path: {0}")]
	InvalidPath(String),
	#[error("Insufficient input amount")]
	InsufficientInputAmount,
	#[error("Insufficient liquidity")]
	InsufficientLiquidity,
	#[error("Insufficient output amount: got {actual}, minimum {minimum}")]
	InsufficientOutputAmount { actual: U256, minimum: U256 },
	#[error("Insufficient amount of {token}: got {actual}, minimum {minimum}")]
	InsufficientAmount {
		token: Address,
		actual: U256,
		minimum: U256,
	},
	#[error("Insufficient liquidity minted")]
	InsufficientLiquidityMinted,
	#[error("Insufficient liquidity burned")]
	InsufficientLiquidityBurned,
	#[error("No pair for {0} and {1}")]
	PairNotFound(Address, Address),
	#[error("Deadline {deadline} passed at {now}")]
	Expired { deadline: Timestamp, now: Timestamp },
	#[error("Arithmetic overflow")]
	Overflow,
	#[error("Endpoint unreachable: {0}")]
	Unreachable(String),
	#[error("Ledger error: {0}")]
	Ledger(#[from] LedgerError),
}

/// Trait defining the interface of a whitelisted liquidity endpoint.
///
/// Execution calls name the `sender` whose assets and allowances are spent;
/// the endpoint pulls from `sender` using the allowance granted to its own
/// [`address`](EndpointInterface::address).
#[async_trait]
pub trait EndpointInterface: Send + Sync {
	/// Identity of this endpoint.
	fn address(&self) -> Address;

	/// Estimates the amounts produced at every hop of `path` for `amount_in`.
	/// Fails when the path cannot be routed.
	async fn quote(&self, amount_in: U256, path: &[Address]) -> Result<Vec<U256>, EndpointError>;

	/// Executes an exact-input swap and returns the realized amount sequence.
	async fn execute_swap(
		&self,
		sender: Address,
		params: &SwapParams,
	) -> Result<Vec<U256>, EndpointError>;

	async fn execute_liquidity_deposit(
		&self,
		sender: Address,
		params: &DepositParams,
	) -> Result<DepositReceipt, EndpointError>;

	async fn execute_liquidity_withdrawal(
		&self,
		sender: Address,
		params: &WithdrawalParams,
	) -> Result<WithdrawalReceipt, EndpointError>;

	/// Registry of the pairs this endpoint trades through.
	fn pair_registry(&self) -> Arc<dyn PairRegistryInterface>;
}

/// Trait defining the pair registry reached through an endpoint.
#[async_trait]
pub trait PairRegistryInterface: Send + Sync {
	fn address(&self) -> Address;

	/// Returns the share token of the `(token_a, token_b)` pair, in either
	/// order, if the pair exists.
	async fn get_pair(
		&self,
		token_a: Address,
		token_b: Address,
	) -> Result<Option<Address>, EndpointError>;
}
