//! Parameter and receipt types exchanged with liquidity endpoints.

use gateway_types::{Address, Timestamp, U256};

/// Exact-input swap along a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapParams {
	pub amount_in: U256,
	pub min_amount_out: U256,
	pub path: Vec<Address>,
	pub recipient: Address,
	pub deadline: Timestamp,
}

/// Paired deposit of two assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositParams {
	pub token_a: Address,
	pub token_b: Address,
	pub amount_a_desired: U256,
	pub amount_b_desired: U256,
	pub amount_a_min: U256,
	pub amount_b_min: U256,
	pub recipient: Address,
	pub deadline: Timestamp,
}

/// Amounts actually pulled by a deposit and the shares issued for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositReceipt {
	pub amount_a: U256,
	pub amount_b: U256,
	pub shares: U256,
}

/// Redemption of pool shares for the underlying assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalParams {
	pub token_a: Address,
	pub token_b: Address,
	pub shares: U256,
	pub amount_a_min: U256,
	pub amount_b_min: U256,
	pub recipient: Address,
	pub deadline: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalReceipt {
	pub amount_a: U256,
	pub amount_b: U256,
}
