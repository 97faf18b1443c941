//! In-memory ledger implementation.
//!
//! Balances, allowances and supplies live in hash maps behind a single mutex.
//! While at least one checkpoint is open every change is recorded in an undo
//! log, so a rollback restores the exact prior values.

use crate::{Checkpoint, LedgerError, LedgerInterface};
use async_trait::async_trait;
use gateway_types::{
	address_field, amount_field, Address, ConfigSchema, Field, FieldType, Schema, U256,
	ValidationError,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

type BalanceKey = (Address, Address);
type AllowanceKey = (Address, Address, Address);

enum JournalEntry {
	Balance {
		key: BalanceKey,
		previous: U256,
	},
	Allowance {
		key: AllowanceKey,
		previous: U256,
	},
	Supply {
		asset: Address,
		previous: U256,
	},
}

#[derive(Default)]
struct LedgerState {
	/// Keyed by (asset, account).
	balances: HashMap<BalanceKey, U256>,
	/// Keyed by (asset, owner, spender).
	allowances: HashMap<AllowanceKey, U256>,
	supplies: HashMap<Address, U256>,
	journal: Vec<JournalEntry>,
	/// Journal length at each open checkpoint, innermost last.
	checkpoints: Vec<usize>,
}

impl LedgerState {
	fn recording(&self) -> bool {
		!self.checkpoints.is_empty()
	}

	fn balance(&self, asset: Address, account: Address) -> U256 {
		self.balances
			.get(&(asset, account))
			.copied()
			.unwrap_or(U256::ZERO)
	}

	fn allowance(&self, asset: Address, owner: Address, spender: Address) -> U256 {
		self.allowances
			.get(&(asset, owner, spender))
			.copied()
			.unwrap_or(U256::ZERO)
	}

	fn supply(&self, asset: Address) -> U256 {
		self.supplies.get(&asset).copied().unwrap_or(U256::ZERO)
	}

	fn set_balance(&mut self, asset: Address, account: Address, value: U256) {
		let key = (asset, account);
		if self.recording() {
			let previous = self.balance(asset, account);
			self.journal.push(JournalEntry::Balance { key, previous });
		}
		self.balances.insert(key, value);
	}

	fn set_allowance(&mut self, asset: Address, owner: Address, spender: Address, value: U256) {
		let key = (asset, owner, spender);
		if self.recording() {
			let previous = self.allowance(asset, owner, spender);
			self.journal.push(JournalEntry::Allowance { key, previous });
		}
		self.allowances.insert(key, value);
	}

	fn set_supply(&mut self, asset: Address, value: U256) {
		if self.recording() {
			let previous = self.supply(asset);
			self.journal.push(JournalEntry::Supply { asset, previous });
		}
		self.supplies.insert(asset, value);
	}

	fn move_balance(
		&mut self,
		asset: Address,
		from: Address,
		to: Address,
		amount: U256,
	) -> Result<(), LedgerError> {
		let available = self.balance(asset, from);
		let remaining =
			available
				.checked_sub(amount)
				.ok_or(LedgerError::InsufficientBalance {
					asset,
					account: from,
					needed: amount,
					available,
				})?;
		self.set_balance(asset, from, remaining);

		let credited = self
			.balance(asset, to)
			.checked_add(amount)
			.ok_or(LedgerError::Overflow(asset))?;
		self.set_balance(asset, to, credited);
		Ok(())
	}

	fn open_checkpoint(&mut self) -> Checkpoint {
		self.checkpoints.push(self.journal.len());
		Checkpoint(self.checkpoints.len())
	}

	fn close_checkpoint(&mut self, checkpoint: Checkpoint) -> Result<usize, LedgerError> {
		if checkpoint.0 == 0 || checkpoint.0 != self.checkpoints.len() {
			return Err(LedgerError::UnknownCheckpoint(checkpoint.0));
		}
		self.checkpoints
			.pop()
			.ok_or(LedgerError::UnknownCheckpoint(checkpoint.0))
	}

	/// Drops `checkpoint` and every checkpoint opened inside it, returning the
	/// journal mark of `checkpoint`.
	fn unwind_checkpoint(&mut self, checkpoint: Checkpoint) -> Result<usize, LedgerError> {
		if checkpoint.0 == 0 || checkpoint.0 > self.checkpoints.len() {
			return Err(LedgerError::UnknownCheckpoint(checkpoint.0));
		}
		let mark = self.checkpoints[checkpoint.0 - 1];
		self.checkpoints.truncate(checkpoint.0 - 1);
		Ok(mark)
	}

	fn undo_to(&mut self, mark: usize) {
		while self.journal.len() > mark {
			match self.journal.pop() {
				Some(JournalEntry::Balance { key, previous }) => {
					self.balances.insert(key, previous);
				}
				Some(JournalEntry::Allowance { key, previous }) => {
					self.allowances.insert(key, previous);
				}
				Some(JournalEntry::Supply { asset, previous }) => {
					self.supplies.insert(asset, previous);
				}
				None => break,
			}
		}
	}
}

/// Journaled in-memory ledger.
#[derive(Default)]
pub struct MemoryLedger {
	state: Mutex<LedgerState>,
}

impl MemoryLedger {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a ledger whose accounts start with the given balances. Supplies
	/// are derived from the seeded balances.
	pub fn with_balances(balances: impl IntoIterator<Item = (Address, Address, U256)>) -> Self {
		let mut state = LedgerState::default();
		for (asset, account, amount) in balances {
			let balance = state.balance(asset, account).saturating_add(amount);
			state.balances.insert((asset, account), balance);
			let supply = state.supply(asset).saturating_add(amount);
			state.supplies.insert(asset, supply);
		}

		Self {
			state: Mutex::new(state),
		}
	}

	/// Number of checkpoints currently open.
	pub async fn open_checkpoints(&self) -> usize {
		self.state.lock().await.checkpoints.len()
	}
}

#[async_trait]
impl LedgerInterface for MemoryLedger {
	async fn balance_of(&self, asset: Address, account: Address) -> Result<U256, LedgerError> {
		Ok(self.state.lock().await.balance(asset, account))
	}

	async fn allowance(
		&self,
		asset: Address,
		owner: Address,
		spender: Address,
	) -> Result<U256, LedgerError> {
		Ok(self.state.lock().await.allowance(asset, owner, spender))
	}

	async fn total_supply(&self, asset: Address) -> Result<U256, LedgerError> {
		Ok(self.state.lock().await.supply(asset))
	}

	async fn transfer(
		&self,
		asset: Address,
		from: Address,
		to: Address,
		amount: U256,
	) -> Result<(), LedgerError> {
		self.state.lock().await.move_balance(asset, from, to, amount)
	}

	async fn transfer_from(
		&self,
		asset: Address,
		spender: Address,
		from: Address,
		to: Address,
		amount: U256,
	) -> Result<(), LedgerError> {
		let mut state = self.state.lock().await;

		let available = state.allowance(asset, from, spender);
		if available < amount {
			return Err(LedgerError::InsufficientAllowance {
				asset,
				owner: from,
				spender,
				needed: amount,
				available,
			});
		}

		state.move_balance(asset, from, to, amount)?;

		// An unlimited allowance is never spent down.
		if available != U256::MAX {
			state.set_allowance(asset, from, spender, available - amount);
		}
		Ok(())
	}

	async fn approve(
		&self,
		asset: Address,
		owner: Address,
		spender: Address,
		amount: U256,
	) -> Result<(), LedgerError> {
		self.state
			.lock()
			.await
			.set_allowance(asset, owner, spender, amount);
		Ok(())
	}

	async fn mint(&self, asset: Address, to: Address, amount: U256) -> Result<(), LedgerError> {
		let mut state = self.state.lock().await;

		let supply = state
			.supply(asset)
			.checked_add(amount)
			.ok_or(LedgerError::Overflow(asset))?;
		let balance = state
			.balance(asset, to)
			.checked_add(amount)
			.ok_or(LedgerError::Overflow(asset))?;

		state.set_supply(asset, supply);
		state.set_balance(asset, to, balance);
		Ok(())
	}

	async fn burn(&self, asset: Address, from: Address, amount: U256) -> Result<(), LedgerError> {
		let mut state = self.state.lock().await;

		let available = state.balance(asset, from);
		let remaining =
			available
				.checked_sub(amount)
				.ok_or(LedgerError::InsufficientBalance {
					asset,
					account: from,
					needed: amount,
					available,
				})?;
		let supply = state.supply(asset).saturating_sub(amount);

		state.set_balance(asset, from, remaining);
		state.set_supply(asset, supply);
		Ok(())
	}

	async fn checkpoint(&self) -> Result<Checkpoint, LedgerError> {
		let checkpoint = self.state.lock().await.open_checkpoint();
		debug!(depth = checkpoint.0, "Opened ledger checkpoint");
		Ok(checkpoint)
	}

	async fn commit(&self, checkpoint: Checkpoint) -> Result<(), LedgerError> {
		let mut state = self.state.lock().await;
		state.close_checkpoint(checkpoint)?;
		if state.checkpoints.is_empty() {
			state.journal.clear();
		}
		Ok(())
	}

	async fn rollback(&self, checkpoint: Checkpoint) -> Result<(), LedgerError> {
		let mut state = self.state.lock().await;
		let open = state.checkpoints.len();
		let mark = state.unwind_checkpoint(checkpoint)?;
		let undone = state.journal.len() - mark;
		state.undo_to(mark);
		if open > checkpoint.0 {
			debug!(depth = checkpoint.0, discarded = open - checkpoint.0, "Discarded nested checkpoints");
		}
		debug!(depth = checkpoint.0, undone, "Rolled back ledger checkpoint");
		Ok(())
	}
}

/// Configuration schema for MemoryLedger.
pub struct MemoryLedgerSchema;

impl ConfigSchema for MemoryLedgerSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			// Required fields
			vec![],
			// Optional fields
			vec![Field::new(
				"balances",
				FieldType::Array(Box::new(FieldType::Table(Schema::new(
					vec![
						Field::new("asset", FieldType::Address),
						Field::new("account", FieldType::Address),
						Field::new("amount", FieldType::Amount),
					],
					vec![],
				)))),
			)],
		);

		schema.validate(config)
	}
}

/// Factory function to create a memory ledger from configuration.
///
/// Configuration parameters:
/// - `balances`: optional list of `{ asset, account, amount }` seed balances
pub fn create_ledger(config: &toml::Value) -> Result<Arc<MemoryLedger>, ValidationError> {
	MemoryLedgerSchema.validate(config)?;

	let seeds = config
		.get("balances")
		.and_then(|v| v.as_array())
		.map(|entries| {
			entries
				.iter()
				.filter_map(|entry| {
					Some((
						address_field(entry, "asset")?,
						address_field(entry, "account")?,
						amount_field(entry, "amount")?,
					))
				})
				.collect::<Vec<_>>()
		})
		.unwrap_or_default();

	Ok(Arc::new(MemoryLedger::with_balances(seeds)))
}
