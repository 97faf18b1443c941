//! Constant-product (x * y = k) endpoint running on top of the asset ledger.
//!
//! Pools hold their reserves as ledger balances of the pair identity, and the
//! pair identity doubles as the pool's share token. Pair identities are derived
//! deterministically from the endpoint and the sorted token addresses.
//!
//! Every execution call settles inside its own ledger checkpoint, so a failed
//! call never leaves half-moved funds behind.

use crate::{
	DepositParams, DepositReceipt, EndpointError, EndpointInterface, PairRegistryInterface,
	SwapParams, WithdrawalParams, WithdrawalReceipt,
};
use async_trait::async_trait;
use gateway_ledger::LedgerInterface;
use gateway_types::{
	address_field, amount_field, keccak256, Address, BasisPoints, Clock, ConfigSchema, Field,
	FieldType, Schema, Timestamp, ValidationError, BPS_DENOMINATOR, U256,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Shares permanently locked by the first deposit into a pool.
pub const MINIMUM_LIQUIDITY: u64 = 1_000;

/// Default pool fee, 0.3%.
pub const DEFAULT_POOL_FEE_BPS: BasisPoints = 30;

/// Orders two distinct, non-zero tokens.
pub fn sort_tokens(token_a: Address, token_b: Address) -> Result<(Address, Address), EndpointError> {
	if token_a == token_b {
		return Err(EndpointError::InvalidPath(format!(
			"identical tokens {}",
			token_a
		)));
	}
	let (token0, token1) = if token_a < token_b {
		(token_a, token_b)
	} else {
		(token_b, token_a)
	};
	if token0.is_zero() {
		return Err(EndpointError::InvalidPath("zero token address".into()));
	}
	Ok((token0, token1))
}

/// Output of a single hop for an exact input, net of the pool fee.
pub fn get_amount_out(
	amount_in: U256,
	reserve_in: U256,
	reserve_out: U256,
	fee_bps: BasisPoints,
) -> Result<U256, EndpointError> {
	if amount_in.is_zero() {
		return Err(EndpointError::InsufficientInputAmount);
	}
	if reserve_in.is_zero() || reserve_out.is_zero() {
		return Err(EndpointError::InsufficientLiquidity);
	}

	let denominator_bps = U256::from(BPS_DENOMINATOR);
	let amount_in_with_fee = amount_in
		.checked_mul(denominator_bps - U256::from(fee_bps))
		.ok_or(EndpointError::Overflow)?;
	let numerator = amount_in_with_fee
		.checked_mul(reserve_out)
		.ok_or(EndpointError::Overflow)?;
	let denominator = reserve_in
		.checked_mul(denominator_bps)
		.and_then(|r| r.checked_add(amount_in_with_fee))
		.ok_or(EndpointError::Overflow)?;

	Ok(numerator / denominator)
}

/// Amount of the other asset matching `amount_a` at the current pool ratio.
pub fn quote_amount(
	amount_a: U256,
	reserve_a: U256,
	reserve_b: U256,
) -> Result<U256, EndpointError> {
	if reserve_a.is_zero() || reserve_b.is_zero() {
		return Err(EndpointError::InsufficientLiquidity);
	}
	Ok(amount_a
		.checked_mul(reserve_b)
		.ok_or(EndpointError::Overflow)?
		/ reserve_a)
}

/// Integer square root, rounded down.
pub fn integer_sqrt(y: U256) -> U256 {
	if y > U256::from(3u64) {
		let mut z = y;
		let mut x = y / U256::from(2u64) + U256::from(1u64);
		while x < z {
			z = x;
			x = (y / x + x) / U256::from(2u64);
		}
		z
	} else if !y.is_zero() {
		U256::from(1u64)
	} else {
		U256::ZERO
	}
}

fn derive_address(parts: &[&[u8]]) -> Address {
	let hash = keccak256(parts.concat());
	Address::from_slice(&hash[12..])
}

/// Registry of the pairs created by one constant-product endpoint.
///
/// A pair exists once it has outstanding shares. The first deposit locks
/// [`MINIMUM_LIQUIDITY`] shares for good, so existence follows the ledger
/// journal: a rolled back first deposit leaves no pair behind.
pub struct PairFactory {
	address: Address,
	endpoint: Address,
	ledger: Arc<dyn LedgerInterface>,
}

impl PairFactory {
	pub fn new(address: Address, endpoint: Address, ledger: Arc<dyn LedgerInterface>) -> Self {
		Self {
			address,
			endpoint,
			ledger,
		}
	}

	/// Identity the pair of these tokens has, whether or not it exists yet.
	pub fn pair_for(&self, token_a: Address, token_b: Address) -> Result<Address, EndpointError> {
		let (token0, token1) = sort_tokens(token_a, token_b)?;
		Ok(derive_address(&[
			self.endpoint.as_slice(),
			token0.as_slice(),
			token1.as_slice(),
		]))
	}
}

#[async_trait]
impl PairRegistryInterface for PairFactory {
	fn address(&self) -> Address {
		self.address
	}

	async fn get_pair(
		&self,
		token_a: Address,
		token_b: Address,
	) -> Result<Option<Address>, EndpointError> {
		let Ok(pair) = self.pair_for(token_a, token_b) else {
			return Ok(None);
		};
		if self.ledger.total_supply(pair).await?.is_zero() {
			return Ok(None);
		}
		Ok(Some(pair))
	}
}

/// Uniswap-V2-style router over the asset ledger.
pub struct ConstantProductEndpoint {
	address: Address,
	fee_bps: BasisPoints,
	factory: Arc<PairFactory>,
	ledger: Arc<dyn LedgerInterface>,
	clock: Arc<dyn Clock>,
}

struct PlannedDeposit {
	pair: Address,
	amount_a: U256,
	amount_b: U256,
	shares: U256,
	/// Shares locked to the zero address on the first deposit.
	locked: U256,
}

impl ConstantProductEndpoint {
	pub fn new(
		address: Address,
		fee_bps: BasisPoints,
		ledger: Arc<dyn LedgerInterface>,
		clock: Arc<dyn Clock>,
	) -> Self {
		let factory_address = derive_address(&[address.as_slice(), b"factory".as_slice()]);
		Self::with_factory(address, factory_address, fee_bps, ledger, clock)
	}

	pub fn with_factory(
		address: Address,
		factory_address: Address,
		fee_bps: BasisPoints,
		ledger: Arc<dyn LedgerInterface>,
		clock: Arc<dyn Clock>,
	) -> Self {
		Self {
			address,
			fee_bps,
			factory: Arc::new(PairFactory::new(factory_address, address, ledger.clone())),
			ledger,
			clock,
		}
	}

	pub fn fee_bps(&self) -> BasisPoints {
		self.fee_bps
	}

	pub fn factory(&self) -> &Arc<PairFactory> {
		&self.factory
	}

	/// Creates a pool with the given reserves, minting its assets straight into
	/// the pair and the initial shares to `provider`.
	pub async fn seed_pool(
		&self,
		token_a: Address,
		token_b: Address,
		reserve_a: U256,
		reserve_b: U256,
		provider: Address,
	) -> Result<Address, EndpointError> {
		let pair = self.factory.pair_for(token_a, token_b)?;
		let plan = self
			.plan_deposit(pair, token_a, token_b, reserve_a, reserve_b, U256::ZERO, U256::ZERO)
			.await?;

		self.ledger.mint(token_a, pair, plan.amount_a).await?;
		self.ledger.mint(token_b, pair, plan.amount_b).await?;
		self.issue_shares(&plan, provider).await?;

		info!(
			endpoint = %self.address,
			%pair,
			%reserve_a,
			%reserve_b,
			"Seeded constant-product pool"
		);
		Ok(pair)
	}

	fn ensure_deadline(&self, deadline: Timestamp) -> Result<(), EndpointError> {
		let now = self.clock.now();
		if now > deadline {
			return Err(EndpointError::Expired { deadline, now });
		}
		Ok(())
	}

	async fn existing_pair(
		&self,
		token_a: Address,
		token_b: Address,
	) -> Result<Address, EndpointError> {
		self.factory
			.get_pair(token_a, token_b)
			.await?
			.ok_or(EndpointError::PairNotFound(token_a, token_b))
	}

	async fn reserves(
		&self,
		pair: Address,
		token_a: Address,
		token_b: Address,
	) -> Result<(U256, U256), EndpointError> {
		let reserve_a = self.ledger.balance_of(token_a, pair).await?;
		let reserve_b = self.ledger.balance_of(token_b, pair).await?;
		Ok((reserve_a, reserve_b))
	}

	async fn amounts_out(
		&self,
		amount_in: U256,
		path: &[Address],
	) -> Result<(Vec<U256>, Vec<Address>), EndpointError> {
		if path.len() < 2 {
			return Err(EndpointError::InvalidPath(format!(
				"path needs at least two assets, got {}",
				path.len()
			)));
		}

		let mut amounts = Vec::with_capacity(path.len());
		let mut pairs = Vec::with_capacity(path.len() - 1);
		amounts.push(amount_in);

		for hop in path.windows(2) {
			let pair = self.existing_pair(hop[0], hop[1]).await?;
			let (reserve_in, reserve_out) = self.reserves(pair, hop[0], hop[1]).await?;
			let previous = amounts[amounts.len() - 1];
			amounts.push(get_amount_out(
				previous,
				reserve_in,
				reserve_out,
				self.fee_bps,
			)?);
			pairs.push(pair);
		}

		Ok((amounts, pairs))
	}

	#[allow(clippy::too_many_arguments)]
	async fn plan_deposit(
		&self,
		pair: Address,
		token_a: Address,
		token_b: Address,
		amount_a_desired: U256,
		amount_b_desired: U256,
		amount_a_min: U256,
		amount_b_min: U256,
	) -> Result<PlannedDeposit, EndpointError> {
		let (reserve_a, reserve_b) = self.reserves(pair, token_a, token_b).await?;

		let (amount_a, amount_b) = if reserve_a.is_zero() && reserve_b.is_zero() {
			(amount_a_desired, amount_b_desired)
		} else {
			let amount_b_optimal = quote_amount(amount_a_desired, reserve_a, reserve_b)?;
			if amount_b_optimal <= amount_b_desired {
				if amount_b_optimal < amount_b_min {
					return Err(EndpointError::InsufficientAmount {
						token: token_b,
						actual: amount_b_optimal,
						minimum: amount_b_min,
					});
				}
				(amount_a_desired, amount_b_optimal)
			} else {
				let amount_a_optimal = quote_amount(amount_b_desired, reserve_b, reserve_a)?;
				if amount_a_optimal < amount_a_min {
					return Err(EndpointError::InsufficientAmount {
						token: token_a,
						actual: amount_a_optimal,
						minimum: amount_a_min,
					});
				}
				(amount_a_optimal, amount_b_desired)
			}
		};

		let supply = self.ledger.total_supply(pair).await?;
		let minimum = U256::from(MINIMUM_LIQUIDITY);
		let (shares, locked) = if supply.is_zero() {
			let product = amount_a
				.checked_mul(amount_b)
				.ok_or(EndpointError::Overflow)?;
			let root = integer_sqrt(product);
			if root <= minimum {
				return Err(EndpointError::InsufficientLiquidityMinted);
			}
			(root - minimum, minimum)
		} else {
			let by_a = amount_a
				.checked_mul(supply)
				.ok_or(EndpointError::Overflow)?
				/ reserve_a;
			let by_b = amount_b
				.checked_mul(supply)
				.ok_or(EndpointError::Overflow)?
				/ reserve_b;
			(by_a.min(by_b), U256::ZERO)
		};

		if shares.is_zero() {
			return Err(EndpointError::InsufficientLiquidityMinted);
		}

		Ok(PlannedDeposit {
			pair,
			amount_a,
			amount_b,
			shares,
			locked,
		})
	}

	async fn issue_shares(
		&self,
		plan: &PlannedDeposit,
		recipient: Address,
	) -> Result<(), EndpointError> {
		if !plan.locked.is_zero() {
			self.ledger.mint(plan.pair, Address::ZERO, plan.locked).await?;
		}
		self.ledger.mint(plan.pair, recipient, plan.shares).await?;
		Ok(())
	}

	async fn settle_swap(
		&self,
		sender: Address,
		params: &SwapParams,
	) -> Result<Vec<U256>, EndpointError> {
		let (amounts, pairs) = self.amounts_out(params.amount_in, &params.path).await?;
		let amount_out = amounts[amounts.len() - 1];
		if amount_out < params.min_amount_out {
			return Err(EndpointError::InsufficientOutputAmount {
				actual: amount_out,
				minimum: params.min_amount_out,
			});
		}

		self.ledger
			.transfer_from(params.path[0], self.address, sender, pairs[0], amounts[0])
			.await?;

		for (i, pair) in pairs.iter().enumerate() {
			let to = pairs.get(i + 1).copied().unwrap_or(params.recipient);
			self.ledger
				.transfer(params.path[i + 1], *pair, to, amounts[i + 1])
				.await?;
		}

		Ok(amounts)
	}

	async fn settle_deposit(
		&self,
		sender: Address,
		params: &DepositParams,
	) -> Result<DepositReceipt, EndpointError> {
		let pair = match self.factory.get_pair(params.token_a, params.token_b).await? {
			Some(pair) => pair,
			None => self.factory.pair_for(params.token_a, params.token_b)?,
		};

		let plan = self
			.plan_deposit(
				pair,
				params.token_a,
				params.token_b,
				params.amount_a_desired,
				params.amount_b_desired,
				params.amount_a_min,
				params.amount_b_min,
			)
			.await?;

		self.ledger
			.transfer_from(params.token_a, self.address, sender, pair, plan.amount_a)
			.await?;
		self.ledger
			.transfer_from(params.token_b, self.address, sender, pair, plan.amount_b)
			.await?;
		self.issue_shares(&plan, params.recipient).await?;

		Ok(DepositReceipt {
			amount_a: plan.amount_a,
			amount_b: plan.amount_b,
			shares: plan.shares,
		})
	}

	async fn settle_withdrawal(
		&self,
		sender: Address,
		params: &WithdrawalParams,
	) -> Result<WithdrawalReceipt, EndpointError> {
		let pair = self.existing_pair(params.token_a, params.token_b).await?;
		let (reserve_a, reserve_b) = self.reserves(pair, params.token_a, params.token_b).await?;
		let supply = self.ledger.total_supply(pair).await?;
		if supply.is_zero() {
			return Err(EndpointError::InsufficientLiquidityBurned);
		}

		let amount_a = params
			.shares
			.checked_mul(reserve_a)
			.ok_or(EndpointError::Overflow)?
			/ supply;
		let amount_b = params
			.shares
			.checked_mul(reserve_b)
			.ok_or(EndpointError::Overflow)?
			/ supply;

		if amount_a.is_zero() || amount_b.is_zero() {
			return Err(EndpointError::InsufficientLiquidityBurned);
		}
		if amount_a < params.amount_a_min {
			return Err(EndpointError::InsufficientAmount {
				token: params.token_a,
				actual: amount_a,
				minimum: params.amount_a_min,
			});
		}
		if amount_b < params.amount_b_min {
			return Err(EndpointError::InsufficientAmount {
				token: params.token_b,
				actual: amount_b,
				minimum: params.amount_b_min,
			});
		}

		self.ledger
			.transfer_from(pair, self.address, sender, pair, params.shares)
			.await?;
		self.ledger.burn(pair, pair, params.shares).await?;
		self.ledger
			.transfer(params.token_a, pair, params.recipient, amount_a)
			.await?;
		self.ledger
			.transfer(params.token_b, pair, params.recipient, amount_b)
			.await?;

		Ok(WithdrawalReceipt { amount_a, amount_b })
	}

	/// Commits the ledger checkpoint on success and rolls it back otherwise.
	async fn finish<T>(
		&self,
		checkpoint: gateway_ledger::Checkpoint,
		result: Result<T, EndpointError>,
	) -> Result<T, EndpointError> {
		match result {
			Ok(value) => {
				self.ledger.commit(checkpoint).await?;
				Ok(value)
			}
			Err(e) => {
				self.ledger.rollback(checkpoint).await?;
				Err(e)
			}
		}
	}
}

#[async_trait]
impl EndpointInterface for ConstantProductEndpoint {
	fn address(&self) -> Address {
		self.address
	}

	async fn quote(&self, amount_in: U256, path: &[Address]) -> Result<Vec<U256>, EndpointError> {
		let (amounts, _) = self.amounts_out(amount_in, path).await?;
		Ok(amounts)
	}

	async fn execute_swap(
		&self,
		sender: Address,
		params: &SwapParams,
	) -> Result<Vec<U256>, EndpointError> {
		self.ensure_deadline(params.deadline)?;

		let checkpoint = self.ledger.checkpoint().await?;
		let result = self.settle_swap(sender, params).await;
		let amounts = self.finish(checkpoint, result).await?;

		debug!(
			endpoint = %self.address,
			amount_in = %params.amount_in,
			amount_out = %amounts[amounts.len() - 1],
			"Executed swap"
		);
		Ok(amounts)
	}

	async fn execute_liquidity_deposit(
		&self,
		sender: Address,
		params: &DepositParams,
	) -> Result<DepositReceipt, EndpointError> {
		self.ensure_deadline(params.deadline)?;

		let checkpoint = self.ledger.checkpoint().await?;
		let result = self.settle_deposit(sender, params).await;
		let receipt = self.finish(checkpoint, result).await?;

		debug!(
			endpoint = %self.address,
			shares = %receipt.shares,
			"Executed liquidity deposit"
		);
		Ok(receipt)
	}

	async fn execute_liquidity_withdrawal(
		&self,
		sender: Address,
		params: &WithdrawalParams,
	) -> Result<WithdrawalReceipt, EndpointError> {
		self.ensure_deadline(params.deadline)?;

		let checkpoint = self.ledger.checkpoint().await?;
		let result = self.settle_withdrawal(sender, params).await;
		self.finish(checkpoint, result).await
	}

	fn pair_registry(&self) -> Arc<dyn PairRegistryInterface> {
		self.factory.clone()
	}
}

/// Configuration schema for ConstantProductEndpoint.
pub struct ConstantProductSchema;

impl ConfigSchema for ConstantProductSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let pool = Schema::new(
			vec![
				Field::new("token_a", FieldType::Address),
				Field::new("token_b", FieldType::Address),
				Field::new("reserve_a", FieldType::Amount),
				Field::new("reserve_b", FieldType::Amount),
			],
			vec![Field::new("provider", FieldType::Address)],
		);

		let schema = Schema::new(
			// Required fields
			vec![Field::new("address", FieldType::Address)],
			// Optional fields
			vec![
				Field::new("factory", FieldType::Address),
				Field::new(
					"fee_bps",
					FieldType::Integer {
						min: Some(0),
						max: Some(1_000),
					},
				),
				Field::new("pools", FieldType::Array(Box::new(FieldType::Table(pool)))),
			],
		);

		schema.validate(config)
	}
}

/// Factory function to create a constant-product endpoint from configuration.
///
/// Configuration parameters:
/// - `address`: endpoint identity (required)
/// - `factory`: pair registry identity (default: derived from `address`)
/// - `fee_bps`: pool fee in basis points (default: 30)
/// - `pools`: optional `{ token_a, token_b, reserve_a, reserve_b, provider }`
///   pools seeded at creation; shares go to `provider` (default: `address`)
pub async fn create_endpoint(
	config: toml::Value,
	ledger: Arc<dyn LedgerInterface>,
	clock: Arc<dyn Clock>,
) -> Result<Arc<ConstantProductEndpoint>, EndpointError> {
	ConstantProductSchema
		.validate(&config)
		.map_err(|e| EndpointError::Unreachable(format!("Invalid configuration: {}", e)))?;

	let address = address_field(&config, "address")
		.ok_or_else(|| EndpointError::Unreachable("address is required".into()))?;
	let fee_bps = config
		.get("fee_bps")
		.and_then(|v| v.as_integer())
		.map(|v| v as BasisPoints)
		.unwrap_or(DEFAULT_POOL_FEE_BPS);

	let endpoint = match address_field(&config, "factory") {
		Some(factory) => {
			ConstantProductEndpoint::with_factory(address, factory, fee_bps, ledger, clock)
		}
		None => ConstantProductEndpoint::new(address, fee_bps, ledger, clock),
	};

	if let Some(pools) = config.get("pools").and_then(|v| v.as_array()) {
		for pool in pools {
			let (Some(token_a), Some(token_b), Some(reserve_a), Some(reserve_b)) = (
				address_field(pool, "token_a"),
				address_field(pool, "token_b"),
				amount_field(pool, "reserve_a"),
				amount_field(pool, "reserve_b"),
			) else {
				continue;
			};
			let provider = address_field(pool, "provider").unwrap_or(address);
			endpoint
				.seed_pool(token_a, token_b, reserve_a, reserve_b, provider)
				.await?;
		}
	}

	Ok(Arc::new(endpoint))
}

#[cfg(test)]
mod tests {
	use super::*;
	use gateway_ledger::implementations::memory::MemoryLedger;
	use gateway_types::ManualClock;

	const NOW: Timestamp = 1_700_000_000;

	fn token_a() -> Address {
		Address::repeat_byte(0xa1)
	}

	fn token_b() -> Address {
		Address::repeat_byte(0xb2)
	}

	fn trader() -> Address {
		Address::repeat_byte(0x07)
	}

	fn endpoint_address() -> Address {
		Address::repeat_byte(0xe0)
	}

	fn units(v: u64) -> U256 {
		U256::from(v)
	}

	async fn setup() -> (Arc<MemoryLedger>, ConstantProductEndpoint, Address) {
		let ledger = Arc::new(MemoryLedger::with_balances([
			(token_a(), trader(), units(1_000_000)),
			(token_b(), trader(), units(1_000_000)),
		]));
		let endpoint = ConstantProductEndpoint::new(
			endpoint_address(),
			DEFAULT_POOL_FEE_BPS,
			ledger.clone(),
			Arc::new(ManualClock::new(NOW)),
		);
		let pair = endpoint
			.seed_pool(
				token_a(),
				token_b(),
				units(1_000_000),
				units(2_000_000),
				endpoint_address(),
			)
			.await
			.unwrap();
		(ledger, endpoint, pair)
	}

	#[test]
	fn test_get_amount_out_matches_reference() {
		// 1000 in against 1_000_000 / 2_000_000 reserves at 0.3%:
		// 997 * 2_000_000 * 1000 / (1_000_000 * 1000 + 997_000) = 1992
		let out = get_amount_out(units(1_000), units(1_000_000), units(2_000_000), 30).unwrap();
		assert_eq!(out, units(1_992));

		assert_eq!(
			get_amount_out(U256::ZERO, units(1), units(1), 30),
			Err(EndpointError::InsufficientInputAmount)
		);
		assert_eq!(
			get_amount_out(units(1), U256::ZERO, units(1), 30),
			Err(EndpointError::InsufficientLiquidity)
		);
	}

	#[test]
	fn test_integer_sqrt() {
		assert_eq!(integer_sqrt(U256::ZERO), U256::ZERO);
		assert_eq!(integer_sqrt(units(3)), units(1));
		assert_eq!(integer_sqrt(units(16)), units(4));
		assert_eq!(integer_sqrt(units(17)), units(4));
		assert_eq!(integer_sqrt(units(2_000_000_000_000)), units(1_414_213));
	}

	#[test]
	fn test_sort_tokens() {
		assert_eq!(
			sort_tokens(token_b(), token_a()).unwrap(),
			(token_a(), token_b())
		);
		assert!(sort_tokens(token_a(), token_a()).is_err());
		assert!(sort_tokens(Address::ZERO, token_a()).is_err());
	}

	#[tokio::test]
	async fn test_seeded_pool_is_registered() {
		let (ledger, endpoint, pair) = setup().await;

		let registry = endpoint.pair_registry();
		assert_eq!(
			registry.get_pair(token_b(), token_a()).await.unwrap(),
			Some(pair)
		);
		assert_eq!(ledger.balance_of(token_a(), pair).await.unwrap(), units(1_000_000));
		// sqrt(1e6 * 2e6) = 1_414_213, minus the locked minimum.
		assert_eq!(
			ledger.balance_of(pair, endpoint_address()).await.unwrap(),
			units(1_414_213 - MINIMUM_LIQUIDITY)
		);
	}

	#[tokio::test]
	async fn test_quote_unknown_pair_fails() {
		let (_, endpoint, _) = setup().await;
		let other = Address::repeat_byte(0xc3);

		let err = endpoint.quote(units(10), &[token_a(), other]).await.unwrap_err();
		assert_eq!(err, EndpointError::PairNotFound(token_a(), other));
	}

	#[tokio::test]
	async fn test_swap_pays_recipient() {
		let (ledger, endpoint, pair) = setup().await;
		ledger
			.approve(token_a(), trader(), endpoint_address(), units(1_000))
			.await
			.unwrap();

		let recipient = Address::repeat_byte(0x08);
		let amounts = endpoint
			.execute_swap(
				trader(),
				&SwapParams {
					amount_in: units(1_000),
					min_amount_out: units(1_900),
					path: vec![token_a(), token_b()],
					recipient,
					deadline: NOW,
				},
			)
			.await
			.unwrap();

		assert_eq!(amounts, vec![units(1_000), units(1_992)]);
		assert_eq!(ledger.balance_of(token_b(), recipient).await.unwrap(), units(1_992));
		assert_eq!(ledger.balance_of(token_a(), pair).await.unwrap(), units(1_001_000));
	}

	#[tokio::test]
	async fn test_swap_respects_deadline_and_minimum() {
		let (ledger, endpoint, _) = setup().await;
		ledger
			.approve(token_a(), trader(), endpoint_address(), units(1_000))
			.await
			.unwrap();

		let mut params = SwapParams {
			amount_in: units(1_000),
			min_amount_out: units(1),
			path: vec![token_a(), token_b()],
			recipient: trader(),
			deadline: NOW - 1,
		};
		assert!(matches!(
			endpoint.execute_swap(trader(), &params).await,
			Err(EndpointError::Expired { .. })
		));

		params.deadline = NOW;
		params.min_amount_out = units(5_000);
		assert!(matches!(
			endpoint.execute_swap(trader(), &params).await,
			Err(EndpointError::InsufficientOutputAmount { .. })
		));

		// Nothing moved.
		assert_eq!(
			ledger.balance_of(token_a(), trader()).await.unwrap(),
			units(1_000_000)
		);
		assert_eq!(ledger.open_checkpoints().await, 0);
	}

	#[tokio::test]
	async fn test_deposit_uses_pool_ratio_and_withdrawal_returns_assets() {
		let (ledger, endpoint, pair) = setup().await;
		ledger
			.approve(token_a(), trader(), endpoint_address(), units(1_000))
			.await
			.unwrap();
		ledger
			.approve(token_b(), trader(), endpoint_address(), units(5_000))
			.await
			.unwrap();

		let receipt = endpoint
			.execute_liquidity_deposit(
				trader(),
				&DepositParams {
					token_a: token_a(),
					token_b: token_b(),
					amount_a_desired: units(1_000),
					amount_b_desired: units(5_000),
					amount_a_min: U256::ZERO,
					amount_b_min: U256::ZERO,
					recipient: trader(),
					deadline: NOW,
				},
			)
			.await
			.unwrap();

		assert_eq!(receipt.amount_a, units(1_000));
		assert_eq!(receipt.amount_b, units(2_000));
		// 1000 * 1_414_213 / 1_000_000 = 1414
		assert_eq!(receipt.shares, units(1_414));

		ledger
			.approve(pair, trader(), endpoint_address(), receipt.shares)
			.await
			.unwrap();
		let withdrawn = endpoint
			.execute_liquidity_withdrawal(
				trader(),
				&WithdrawalParams {
					token_a: token_a(),
					token_b: token_b(),
					shares: receipt.shares,
					amount_a_min: U256::ZERO,
					amount_b_min: U256::ZERO,
					recipient: trader(),
					deadline: NOW,
				},
			)
			.await
			.unwrap();

		assert!(withdrawn.amount_a <= receipt.amount_a);
		assert!(withdrawn.amount_b <= receipt.amount_b);
		assert_eq!(ledger.balance_of(pair, trader()).await.unwrap(), U256::ZERO);
	}

	#[tokio::test]
	async fn test_failed_deposit_rolls_back() {
		let (ledger, endpoint, _) = setup().await;
		// Allowance for token A only: the second pull fails.
		ledger
			.approve(token_a(), trader(), endpoint_address(), units(1_000))
			.await
			.unwrap();

		let err = endpoint
			.execute_liquidity_deposit(
				trader(),
				&DepositParams {
					token_a: token_a(),
					token_b: token_b(),
					amount_a_desired: units(1_000),
					amount_b_desired: units(2_000),
					amount_a_min: U256::ZERO,
					amount_b_min: U256::ZERO,
					recipient: trader(),
					deadline: NOW,
				},
			)
			.await
			.unwrap_err();

		assert!(matches!(err, EndpointError::Ledger(_)));
		assert_eq!(
			ledger.balance_of(token_a(), trader()).await.unwrap(),
			units(1_000_000)
		);
	}

	#[tokio::test]
	async fn test_pair_from_rolled_back_first_deposit_is_gone() {
		let (ledger, endpoint, _) = setup().await;
		let token_c = Address::repeat_byte(0xc3);
		ledger.mint(token_c, trader(), units(10_000)).await.unwrap();
		ledger
			.approve(token_a(), trader(), endpoint_address(), units(10_000))
			.await
			.unwrap();
		ledger
			.approve(token_c, trader(), endpoint_address(), units(10_000))
			.await
			.unwrap();

		let outer = ledger.checkpoint().await.unwrap();
		let receipt = endpoint
			.execute_liquidity_deposit(
				trader(),
				&DepositParams {
					token_a: token_a(),
					token_b: token_c,
					amount_a_desired: units(10_000),
					amount_b_desired: units(10_000),
					amount_a_min: U256::ZERO,
					amount_b_min: U256::ZERO,
					recipient: trader(),
					deadline: NOW,
				},
			)
			.await
			.unwrap();
		let pair = endpoint.factory().pair_for(token_a(), token_c).unwrap();
		assert_eq!(
			endpoint.pair_registry().get_pair(token_a(), token_c).await.unwrap(),
			Some(pair)
		);
		assert_eq!(ledger.balance_of(pair, trader()).await.unwrap(), receipt.shares);

		ledger.rollback(outer).await.unwrap();

		assert_eq!(
			endpoint.pair_registry().get_pair(token_a(), token_c).await.unwrap(),
			None
		);
		assert!(matches!(
			endpoint.quote(units(100), &[token_a(), token_c]).await,
			Err(EndpointError::PairNotFound(_, _))
		));
	}

	#[tokio::test]
	async fn test_create_endpoint_from_config() {
		let ledger: Arc<dyn LedgerInterface> = Arc::new(MemoryLedger::new());
		let config: toml::Value = toml::from_str(
			r#"
address = "0xe0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0"
fee_bps = 25
pools = [
	{ token_a = "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1", token_b = "0xb2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2", reserve_a = "1000000", reserve_b = "1000000" },
]
"#,
		)
		.unwrap();

		let endpoint = create_endpoint(config, ledger, Arc::new(ManualClock::new(NOW)))
			.await
			.unwrap();

		assert_eq!(endpoint.address(), endpoint_address());
		assert_eq!(endpoint.fee_bps(), 25);
		let pair = endpoint.factory().pair_for(token_a(), token_b()).unwrap();
		assert_eq!(
			endpoint.pair_registry().get_pair(token_a(), token_b()).await.unwrap(),
			Some(pair)
		);
	}
}
