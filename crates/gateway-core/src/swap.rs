//! Exact-input swaps routed through the best-quoting endpoint.

use crate::gateway::{catch_panics, validate_path};
use crate::{Gateway, GatewayError};
use gateway_endpoint::{EndpointError, SwapParams};
use gateway_types::{final_amount, Address, GatewayEvent, Timestamp, TradeEvent, U256};
use tracing::{info, instrument};

impl Gateway {
	/// Swaps `amount_in` of `path[0]` for `path.last()`, paid to `caller`.
	///
	/// The gateway keeps its fee out of `amount_in` and routes the rest through
	/// the endpoint with the best quote. `caller` must have approved the
	/// gateway for `amount_in`.
	#[instrument(skip(self, path), fields(hops = path.len().saturating_sub(1)))]
	pub async fn swap(
		&mut self,
		caller: Address,
		amount_in: U256,
		min_amount_out: U256,
		path: &[Address],
		deadline: Timestamp,
	) -> Result<U256, GatewayError> {
		self.ensure_not_paused()?;
		validate_path(path)?;

		let checkpoint = self.begin().await?;
		let result = catch_panics(self.swap_inner(caller, amount_in, min_amount_out, path, deadline)).await;
		self.settle(checkpoint, result).await
	}

	async fn swap_inner(
		&mut self,
		caller: Address,
		amount_in: U256,
		min_amount_out: U256,
		path: &[Address],
		deadline: Timestamp,
	) -> Result<U256, GatewayError> {
		let token_in = path[0];
		let token_out = path[path.len() - 1];

		self.ledger
			.transfer_from(token_in, self.address, caller, self.address, amount_in)
			.await?;

		let split = self.fees.compute_fee(amount_in);

		let quote = self.best_quote(split.net, path).await;
		let router = quote.router.ok_or(GatewayError::NoValidRouter)?;
		if quote.amount_out < min_amount_out {
			return Err(GatewayError::InsufficientOutput {
				quoted: quote.amount_out,
				minimum: min_amount_out,
			});
		}

		let endpoint = self.endpoint(&router)?;
		self.ledger
			.approve(token_in, self.address, router, split.net)
			.await?;

		let amounts = endpoint
			.execute_swap(
				self.address,
				&SwapParams {
					amount_in: split.net,
					min_amount_out,
					path: path.to_vec(),
					recipient: caller,
					deadline,
				},
			)
			.await?;
		let amount_out = final_amount(&amounts)
			.ok_or_else(|| EndpointError::Unreachable("empty swap result".into()))?;

		info!(
			%router,
			%amount_in,
			fee = %split.fee,
			%amount_out,
			"Swap completed"
		);
		self.emit(GatewayEvent::Trade(TradeEvent::SwapCompleted {
			token_in,
			token_out,
			amount_in,
			amount_out,
		}));

		Ok(amount_out)
	}
}
