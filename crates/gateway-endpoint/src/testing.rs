//! Scripted endpoints for tests of code built on [`EndpointInterface`].
//!
//! Available to this crate's tests and, through the `testing` feature, to
//! dependent crates' tests.

use crate::{
	DepositParams, DepositReceipt, EndpointError, EndpointInterface, PairRegistryInterface,
	SwapParams, WithdrawalParams, WithdrawalReceipt,
};
use async_trait::async_trait;
use gateway_types::{Address, U256};
use std::sync::Arc;

/// How a [`MockEndpoint`] answers.
///
/// Unless stated otherwise, every execution call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
	/// Quotes a fixed output.
	Fixed(u64),
	/// Quote fails.
	Fail,
	/// Quote returns no amounts.
	Empty,
	/// Quote never completes.
	Hang,
	/// Quote panics.
	Panic,
	/// Quotes a fixed output, then panics inside `execute_swap`.
	PanicOnSwap(u64),
	/// Quotes a fixed output, then never completes `execute_swap`.
	StallOnSwap(u64),
}

pub struct MockEndpoint {
	address: Address,
	behaviour: Behaviour,
}

impl MockEndpoint {
	pub fn new(address: Address, behaviour: Behaviour) -> Self {
		Self { address, behaviour }
	}
}

/// Mock at `Address::repeat_byte(byte)`.
pub fn mock_endpoint(byte: u8, behaviour: Behaviour) -> Arc<dyn EndpointInterface> {
	Arc::new(MockEndpoint::new(Address::repeat_byte(byte), behaviour))
}

/// Pair registry that knows no pairs.
pub struct NoPairs;

#[async_trait]
impl PairRegistryInterface for NoPairs {
	fn address(&self) -> Address {
		Address::ZERO
	}

	async fn get_pair(&self, _: Address, _: Address) -> Result<Option<Address>, EndpointError> {
		Ok(None)
	}
}

#[async_trait]
impl EndpointInterface for MockEndpoint {
	fn address(&self) -> Address {
		self.address
	}

	async fn quote(&self, amount_in: U256, _path: &[Address]) -> Result<Vec<U256>, EndpointError> {
		match self.behaviour {
			Behaviour::Fixed(out) | Behaviour::PanicOnSwap(out) | Behaviour::StallOnSwap(out) => {
				Ok(vec![amount_in, U256::from(out)])
			}
			Behaviour::Fail => Err(EndpointError::InsufficientLiquidity),
			Behaviour::Empty => Ok(Vec::new()),
			Behaviour::Hang => std::future::pending().await,
			Behaviour::Panic => panic!("endpoint {} crashed while quoting", self.address),
		}
	}

	async fn execute_swap(
		&self,
		_sender: Address,
		_params: &SwapParams,
	) -> Result<Vec<U256>, EndpointError> {
		match self.behaviour {
			Behaviour::PanicOnSwap(_) => panic!("endpoint {} crashed while swapping", self.address),
			Behaviour::StallOnSwap(_) => std::future::pending().await,
			_ => Err(EndpointError::Unreachable("mock".into())),
		}
	}

	async fn execute_liquidity_deposit(
		&self,
		_sender: Address,
		_params: &DepositParams,
	) -> Result<DepositReceipt, EndpointError> {
		Err(EndpointError::Unreachable("mock".into()))
	}

	async fn execute_liquidity_withdrawal(
		&self,
		_sender: Address,
		_params: &WithdrawalParams,
	) -> Result<WithdrawalReceipt, EndpointError> {
		Err(EndpointError::Unreachable("mock".into()))
	}

	fn pair_registry(&self) -> Arc<dyn PairRegistryInterface> {
		Arc::new(NoPairs)
	}
}
