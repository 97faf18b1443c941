//! Asset ledger module for the router gateway.
//!
//! The ledger is the external token capability the gateway consumes: balances,
//! allowances, transfers and supply changes, per asset. It also provides the
//! journal the gateway uses to make every public operation all-or-nothing.

use async_trait::async_trait;
use gateway_types::{Address, U256};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod memory;
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
	#[error("Insufficient balance of {asset} for {account}: need {needed}, have {available}")]
	InsufficientBalance {
		asset: Address,
		account: Address,
		needed: U256,
		available: U256,
	},
	#[error(
		"Insufficient allowance of {asset} from {owner} to {spender}: need {needed}, have {available}"
	)]
	InsufficientAllowance {
		asset: Address,
		owner: Address,
		spender: Address,
		needed: U256,
		available: U256,
	},
	#[error("Arithmetic overflow on asset {0}")]
	Overflow(Address),
	/// A checkpoint was committed or rolled back out of order.
	#[error("Unknown checkpoint {0}")]
	UnknownCheckpoint(usize),
	#[error("Backend error: {0}")]
	Backend(String),
}

/// Handle to an open ledger checkpoint.
///
/// Checkpoints nest: they are committed innermost first, while rolling back
/// an outer checkpoint also discards the ones opened inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(pub usize);

/// Trait defining the interface of an asset ledger.
///
/// Every mutating call names the account acting as the caller explicitly,
/// since there is no ambient message sender.
#[async_trait]
pub trait LedgerInterface: Send + Sync {
	async fn balance_of(&self, asset: Address, account: Address) -> Result<U256, LedgerError>;

	async fn allowance(
		&self,
		asset: Address,
		owner: Address,
		spender: Address,
	) -> Result<U256, LedgerError>;

	async fn total_supply(&self, asset: Address) -> Result<U256, LedgerError>;

	/// Moves `amount` of `asset` from `from` (the caller) to `to`.
	async fn transfer(
		&self,
		asset: Address,
		from: Address,
		to: Address,
		amount: U256,
	) -> Result<(), LedgerError>;

	/// Moves `amount` of `asset` from `from` to `to`, spending the allowance
	/// `from` granted to `spender`.
	async fn transfer_from(
		&self,
		asset: Address,
		spender: Address,
		from: Address,
		to: Address,
		amount: U256,
	) -> Result<(), LedgerError>;

	/// Sets the allowance `owner` grants `spender`, replacing any previous value.
	async fn approve(
		&self,
		asset: Address,
		owner: Address,
		spender: Address,
		amount: U256,
	) -> Result<(), LedgerError>;

	async fn mint(&self, asset: Address, to: Address, amount: U256) -> Result<(), LedgerError>;

	async fn burn(&self, asset: Address, from: Address, amount: U256) -> Result<(), LedgerError>;

	/// Opens a checkpoint. Every change made until the matching commit or
	/// rollback can be undone as a unit.
	async fn checkpoint(&self) -> Result<Checkpoint, LedgerError>;

	/// Keeps every change made since the checkpoint.
	async fn commit(&self, checkpoint: Checkpoint) -> Result<(), LedgerError>;

	/// Undoes every change made since the checkpoint. Checkpoints still open
	/// inside it are discarded along with their changes.
	async fn rollback(&self, checkpoint: Checkpoint) -> Result<(), LedgerError>;
}
