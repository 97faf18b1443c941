//! Single-asset liquidity zapping.
//!
//! Adding liquidity takes one input asset, keeps the gateway fee, swaps half
//! of the rest into the output asset of the path and deposits both halves as
//! a pair. Removing liquidity redeems pool shares through the best-quoting
//! endpoint, unless the caller holds the shares on another registered one.

use crate::gateway::{catch_panics, validate_path};
use crate::{Gateway, GatewayError};
use gateway_endpoint::{
	DepositParams, DepositReceipt, EndpointError, EndpointInterface, SwapParams,
	WithdrawalParams, WithdrawalReceipt,
};
use gateway_types::{final_amount, Address, GatewayEvent, Timestamp, TradeEvent, U256};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// How the net input of an add-liquidity call is divided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZapSplit {
	/// Swapped into the output asset; carries the odd unit.
	pub swapped: U256,
	/// Deposited as is.
	pub kept: U256,
}

pub fn split_for_zap(net: U256) -> ZapSplit {
	let kept = net / U256::from(2u64);
	ZapSplit {
		swapped: net - kept,
		kept,
	}
}

/// Parameters of an add-liquidity call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLiquidity {
	pub amount_in: U256,
	/// Floor for the swap leg; halved before it is applied.
	pub min_amount_out: U256,
	pub path: Vec<Address>,
	pub min_amount_a: U256,
	pub min_amount_b: U256,
	pub deadline: Timestamp,
}

/// Parameters of a remove-liquidity call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveLiquidity {
	pub token_a: Address,
	pub token_b: Address,
	pub liquidity: U256,
	pub min_amount_a: U256,
	pub min_amount_b: U256,
	pub recipient: Address,
	pub deadline: Timestamp,
}

impl Gateway {
	/// Zaps `amount_in` of `path[0]` into the `(path[0], path.last())` pool.
	/// The pool shares go to `caller`, along with any deposit leftovers.
	#[instrument(skip(self, request), fields(amount_in = %request.amount_in))]
	pub async fn add_liquidity(
		&mut self,
		caller: Address,
		request: &AddLiquidity,
	) -> Result<DepositReceipt, GatewayError> {
		self.ensure_not_paused()?;
		validate_path(&request.path)?;

		let checkpoint = self.begin().await?;
		let result = catch_panics(self.add_liquidity_inner(caller, request)).await;
		self.settle(checkpoint, result).await
	}

	async fn add_liquidity_inner(
		&mut self,
		caller: Address,
		request: &AddLiquidity,
	) -> Result<DepositReceipt, GatewayError> {
		let path = &request.path;
		let token_a = path[0];
		let token_b = path[path.len() - 1];

		self.ledger
			.transfer_from(token_a, self.address, caller, self.address, request.amount_in)
			.await?;

		let fee = self.fees.compute_fee(request.amount_in);
		let split = split_for_zap(fee.net);

		let quote = self.best_quote(split.swapped, path).await;
		let router = quote.router.ok_or(GatewayError::NoValidRouter)?;
		let endpoint = self.endpoint(&router)?;

		self.ledger
			.approve(token_a, self.address, router, split.swapped)
			.await?;
		let amounts = endpoint
			.execute_swap(
				self.address,
				&SwapParams {
					amount_in: split.swapped,
					min_amount_out: request.min_amount_out / U256::from(2u64),
					path: path.clone(),
					recipient: self.address,
					deadline: request.deadline,
				},
			)
			.await?;
		let swapped_out = final_amount(&amounts)
			.ok_or_else(|| EndpointError::Unreachable("empty swap result".into()))?;
		debug!(%router, swapped = %split.swapped, %swapped_out, "Swapped first half");

		self.ledger
			.approve(token_b, self.address, router, swapped_out)
			.await?;
		self.ledger
			.approve(token_a, self.address, router, split.kept)
			.await?;

		let receipt = endpoint
			.execute_liquidity_deposit(
				self.address,
				&DepositParams {
					token_a,
					token_b,
					amount_a_desired: split.kept,
					amount_b_desired: swapped_out,
					amount_a_min: request.min_amount_a,
					amount_b_min: request.min_amount_b,
					recipient: caller,
					deadline: request.deadline,
				},
			)
			.await?;

		self.return_leftovers(caller, &endpoint, token_a, split.kept, receipt.amount_a)
			.await?;
		self.return_leftovers(caller, &endpoint, token_b, swapped_out, receipt.amount_b)
			.await?;

		info!(
			%router,
			amount_a = %receipt.amount_a,
			amount_b = %receipt.amount_b,
			shares = %receipt.shares,
			"Liquidity added"
		);
		self.emit(GatewayEvent::Trade(TradeEvent::LiquidityAdded {
			token_a,
			token_b,
			amount_a: receipt.amount_a,
			amount_b: receipt.amount_b,
			shares: receipt.shares,
		}));

		Ok(receipt)
	}

	/// Refunds what the deposit did not use and clears the endpoint allowance.
	async fn return_leftovers(
		&self,
		caller: Address,
		endpoint: &Arc<dyn EndpointInterface>,
		asset: Address,
		offered: U256,
		used: U256,
	) -> Result<(), GatewayError> {
		let leftover = offered.saturating_sub(used);
		if !leftover.is_zero() {
			debug!(%asset, %leftover, "Refunding deposit leftover");
			self.ledger
				.transfer(asset, self.address, caller, leftover)
				.await?;
		}
		self.ledger
			.approve(asset, self.address, endpoint.address(), U256::ZERO)
			.await?;
		Ok(())
	}

	/// Redeems `liquidity` pool shares held by `caller` and pays the
	/// underlying assets to `request.recipient`.
	#[instrument(skip(self, request), fields(token_a = %request.token_a, token_b = %request.token_b))]
	pub async fn remove_liquidity(
		&mut self,
		caller: Address,
		request: &RemoveLiquidity,
	) -> Result<WithdrawalReceipt, GatewayError> {
		self.ensure_not_paused()?;

		let checkpoint = self.begin().await?;
		let result = catch_panics(self.remove_liquidity_inner(caller, request)).await;
		self.settle(checkpoint, result).await
	}

	async fn remove_liquidity_inner(
		&mut self,
		caller: Address,
		request: &RemoveLiquidity,
	) -> Result<WithdrawalReceipt, GatewayError> {
		let (token_a, token_b) = (request.token_a, request.token_b);

		// The quote only selects an endpoint; its amount is never traded.
		let quote = self
			.best_quote(self.selection_amount, &[token_a, token_b])
			.await;
		let quoted = quote.router.ok_or(GatewayError::NoValidRouter)?;
		let (router, endpoint, pair) = self
			.holding_endpoint(caller, quoted, token_a, token_b, request.liquidity)
			.await?;

		self.ledger
			.transfer_from(pair, self.address, caller, self.address, request.liquidity)
			.await?;
		self.ledger
			.approve(pair, self.address, router, request.liquidity)
			.await?;

		let receipt = endpoint
			.execute_liquidity_withdrawal(
				self.address,
				&WithdrawalParams {
					token_a,
					token_b,
					shares: request.liquidity,
					amount_a_min: request.min_amount_a,
					amount_b_min: request.min_amount_b,
					recipient: request.recipient,
					deadline: request.deadline,
				},
			)
			.await?;

		info!(
			%router,
			%pair,
			amount_a = %receipt.amount_a,
			amount_b = %receipt.amount_b,
			"Liquidity removed"
		);
		self.emit(GatewayEvent::Trade(TradeEvent::LiquidityRemoved {
			token_a,
			token_b,
			amount_a: receipt.amount_a,
			amount_b: receipt.amount_b,
			shares: request.liquidity,
		}));

		Ok(receipt)
	}

	/// Picks the endpoint whose pair shares `caller` redeems.
	///
	/// Shares are only redeemable where they were minted, so the quoted
	/// endpoint is kept when the caller holds enough of its pair and
	/// otherwise the first registered endpoint where they do wins. With no
	/// such endpoint the quoted one is used and the pull of shares reports
	/// the shortfall.
	async fn holding_endpoint(
		&self,
		caller: Address,
		quoted: Address,
		token_a: Address,
		token_b: Address,
		liquidity: U256,
	) -> Result<(Address, Arc<dyn EndpointInterface>, Address), GatewayError> {
		let endpoint = self.endpoint(&quoted)?;
		let pair = endpoint.pair_registry().get_pair(token_a, token_b).await?;
		if let Some(pair) = pair {
			if self.ledger.balance_of(pair, caller).await? >= liquidity {
				return Ok((quoted, endpoint, pair));
			}
		}

		for candidate in self.registry.iter() {
			let router = candidate.address();
			if router == quoted {
				continue;
			}
			let Some(candidate_pair) = candidate.pair_registry().get_pair(token_a, token_b).await? else {
				continue;
			};
			if self.ledger.balance_of(candidate_pair, caller).await? >= liquidity {
				debug!(%quoted, %router, "Caller's shares are held on another endpoint");
				return Ok((router, candidate.clone(), candidate_pair));
			}
		}

		let pair = pair.ok_or(GatewayError::PairNotFound { token_a, token_b })?;
		Ok((quoted, endpoint, pair))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::*;

	fn add_request(amount_in: u64) -> AddLiquidity {
		AddLiquidity {
			amount_in: U256::from(amount_in),
			min_amount_out: U256::ZERO,
			path: path(),
			min_amount_a: U256::ZERO,
			min_amount_b: U256::ZERO,
			deadline: DEADLINE,
		}
	}

	fn remove_request() -> RemoveLiquidity {
		RemoveLiquidity {
			token_a: TOKEN_A,
			token_b: TOKEN_B,
			liquidity: U256::from(10u64),
			min_amount_a: U256::ZERO,
			min_amount_b: U256::ZERO,
			recipient: TRADER,
			deadline: DEADLINE,
		}
	}

	#[test]
	fn test_split_reconstitutes_net() {
		for net in [0u64, 1, 2, 3, 99, 100, 1_000_001] {
			let split = split_for_zap(U256::from(net));
			assert_eq!(split.swapped + split.kept, U256::from(net));
			assert!(split.swapped >= split.kept);
			assert!(split.swapped - split.kept <= U256::from(1u64));
		}

		let split = split_for_zap(U256::MAX);
		assert_eq!(split.swapped + split.kept, U256::MAX);
	}

	#[tokio::test]
	async fn test_liquidity_paths_fail_while_paused() {
		let (mut gateway, _) = gateway_with(vec![fixed_endpoint(1, 10)]);
		gateway.set_paused(OWNER, true).unwrap();

		assert_eq!(
			gateway.add_liquidity(TRADER, &add_request(100)).await,
			Err(GatewayError::Paused)
		);
		assert_eq!(
			gateway.remove_liquidity(TRADER, &remove_request()).await,
			Err(GatewayError::Paused)
		);
	}

	#[tokio::test]
	async fn test_add_liquidity_without_router() {
		let (mut gateway, ledger) = gateway_with(vec![failing_endpoint(1)]);
		fund_and_approve(&ledger, TOKEN_A, TRADER, U256::from(100u64)).await;

		assert_eq!(
			gateway.add_liquidity(TRADER, &add_request(100)).await,
			Err(GatewayError::NoValidRouter)
		);
		assert_eq!(
			ledger.balance_of(TOKEN_A, TRADER).await.unwrap(),
			U256::from(100u64)
		);
	}

	#[tokio::test]
	async fn test_remove_liquidity_without_router() {
		let (mut gateway, _) = gateway_with(vec![failing_endpoint(1)]);

		assert_eq!(
			gateway.remove_liquidity(TRADER, &remove_request()).await,
			Err(GatewayError::NoValidRouter)
		);
	}

	#[tokio::test]
	async fn test_remove_liquidity_without_pair() {
		let (mut gateway, _) = gateway_with(vec![fixed_endpoint(1, 10)]);

		assert_eq!(
			gateway.remove_liquidity(TRADER, &remove_request()).await,
			Err(GatewayError::PairNotFound {
				token_a: TOKEN_A,
				token_b: TOKEN_B
			})
		);
	}

	#[tokio::test]
	async fn test_add_liquidity_rejects_short_path() {
		let (mut gateway, _) = gateway_with(vec![fixed_endpoint(1, 10)]);
		let mut request = add_request(100);
		request.path = vec![TOKEN_A];

		assert_eq!(
			gateway.add_liquidity(TRADER, &request).await,
			Err(GatewayError::InvalidPath(1))
		);
	}
}
