//! Administrative operations. Each one checks the caller against the
//! authorization gate before touching any state, and none of them is affected
//! by the pause flag.

use crate::gateway::catch_panics;
use crate::{Gateway, GatewayError};
use gateway_endpoint::EndpointInterface;
use gateway_types::{
	Address, BasisPoints, FeeEvent, GatewayEvent, PauseEvent, RegistryEvent, U256,
};
use std::sync::Arc;
use tracing::{info, instrument};

impl Gateway {
	/// Whitelists an endpoint. Returns `false` if it was already registered,
	/// in which case nothing changes and no event is emitted.
	#[instrument(skip(self, endpoint), fields(router = %endpoint.address()))]
	pub fn register_router(
		&mut self,
		caller: Address,
		endpoint: Arc<dyn EndpointInterface>,
	) -> Result<bool, GatewayError> {
		self.ensure_admin(&caller)?;

		let router = endpoint.address();
		let added = self.registry_mut().register(endpoint)?;
		if added {
			self.emit(GatewayEvent::Registry(RegistryEvent::RouterRegistered {
				router,
			}));
			self.publish_pending();
		}
		Ok(added)
	}

	#[instrument(skip(self))]
	pub fn deregister_router(&mut self, caller: Address, router: Address) -> Result<(), GatewayError> {
		self.ensure_admin(&caller)?;

		self.registry_mut().deregister(&router)?;
		self.emit(GatewayEvent::Registry(RegistryEvent::RouterDeregistered {
			router,
		}));
		self.publish_pending();
		Ok(())
	}

	#[instrument(skip(self))]
	pub fn set_fee_rate(&mut self, caller: Address, new_rate: BasisPoints) -> Result<(), GatewayError> {
		self.ensure_admin(&caller)?;

		let old = self.fees.set_rate(new_rate)?;
		info!(old, new = new_rate, "Fee rate updated");
		self.emit(GatewayEvent::Fee(FeeEvent::FeeUpdated { old, new: new_rate }));
		self.publish_pending();
		Ok(())
	}

	/// Sends the whole held balance of `asset` to the administrator.
	#[instrument(skip(self))]
	pub async fn withdraw_fees(&mut self, caller: Address, asset: Address) -> Result<U256, GatewayError> {
		self.ensure_admin(&caller)?;

		let checkpoint = self.begin().await?;
		let result = catch_panics(self.withdraw_fees_inner(caller, asset)).await;
		self.settle(checkpoint, result).await
	}

	async fn withdraw_fees_inner(&mut self, caller: Address, asset: Address) -> Result<U256, GatewayError> {
		let amount = self.ledger.balance_of(asset, self.address).await?;
		if amount.is_zero() {
			return Err(GatewayError::NoFeesToWithdraw(asset));
		}

		self.ledger
			.transfer(asset, self.address, caller, amount)
			.await?;

		info!(%asset, %amount, to = %caller, "Fees withdrawn");
		self.emit(GatewayEvent::Fee(FeeEvent::FeesWithdrawn {
			asset,
			amount,
			to: caller,
		}));
		Ok(amount)
	}

	/// Sets the pause flag. Returns whether the flag changed; an event is
	/// emitted only in that case.
	#[instrument(skip(self))]
	pub fn set_paused(&mut self, caller: Address, paused: bool) -> Result<bool, GatewayError> {
		self.ensure_admin(&caller)?;

		let was_paused = self.pause.set_paused(paused);
		if was_paused == paused {
			return Ok(false);
		}

		let event = if paused {
			PauseEvent::Paused { account: caller }
		} else {
			PauseEvent::Unpaused { account: caller }
		};
		info!(paused, "Pause state changed");
		self.emit(GatewayEvent::Pause(event));
		self.publish_pending();
		Ok(true)
	}
}

#[cfg(test)]
mod tests {
	use crate::test_support::*;
	use crate::GatewayError;
	use gateway_types::{Address, FeeEvent, GatewayEvent, PauseEvent, RegistryEvent, U256};

	#[test]
	fn test_admin_operations_require_owner() {
		let (mut gateway, _) = gateway_with(vec![fixed_endpoint(1, 10)]);
		let intruder = Address::repeat_byte(0x66);

		assert_eq!(
			gateway.register_router(intruder, fixed_endpoint(2, 10)),
			Err(GatewayError::Unauthorized(intruder))
		);
		assert_eq!(
			gateway.deregister_router(intruder, Address::repeat_byte(1)),
			Err(GatewayError::Unauthorized(intruder))
		);
		assert_eq!(
			gateway.set_fee_rate(intruder, 10),
			Err(GatewayError::Unauthorized(intruder))
		);
		assert_eq!(
			gateway.set_paused(intruder, true),
			Err(GatewayError::Unauthorized(intruder))
		);
		assert_eq!(gateway.router_count(), 1);
		assert!(!gateway.is_paused());
	}

	#[test]
	fn test_register_twice_emits_once() {
		let (mut gateway, _) = gateway_with(vec![fixed_endpoint(1, 10)]);
		let mut events = gateway.subscribe();

		assert_eq!(gateway.register_router(OWNER, fixed_endpoint(2, 10)), Ok(true));
		assert_eq!(gateway.register_router(OWNER, fixed_endpoint(2, 10)), Ok(false));

		assert_eq!(gateway.routers(), vec![Address::repeat_byte(1), Address::repeat_byte(2)]);
		assert_eq!(
			events.try_recv().unwrap(),
			GatewayEvent::Registry(RegistryEvent::RouterRegistered {
				router: Address::repeat_byte(2)
			})
		);
		assert!(events.try_recv().is_err());
	}

	#[test]
	fn test_register_zero_identity_fails() {
		let (mut gateway, _) = gateway_with(vec![fixed_endpoint(1, 10)]);
		assert_eq!(
			gateway.register_router(OWNER, fixed_endpoint(0, 10)),
			Err(GatewayError::InvalidEndpointIdentity)
		);
	}

	#[test]
	fn test_deregister() {
		let (mut gateway, _) = gateway_with(vec![
			fixed_endpoint(1, 10),
			fixed_endpoint(2, 10),
			fixed_endpoint(3, 10),
		]);

		gateway.deregister_router(OWNER, Address::repeat_byte(1)).unwrap();
		assert!(!gateway.is_registered(&Address::repeat_byte(1)));
		assert_eq!(gateway.router_count(), 2);
		assert_eq!(gateway.router_at(0), Ok(Address::repeat_byte(3)));

		assert_eq!(
			gateway.deregister_router(OWNER, Address::repeat_byte(1)),
			Err(GatewayError::EndpointNotFound(Address::repeat_byte(1)))
		);
		assert_eq!(
			gateway.router_at(2),
			Err(GatewayError::IndexOutOfRange { index: 2, len: 2 })
		);
	}

	#[test]
	fn test_set_fee_rate() {
		let (mut gateway, _) = gateway_with(vec![fixed_endpoint(1, 10)]);
		let mut events = gateway.subscribe();

		gateway.set_fee_rate(OWNER, 250).unwrap();
		assert_eq!(gateway.fee_rate(), 250);
		assert_eq!(
			events.try_recv().unwrap(),
			GatewayEvent::Fee(FeeEvent::FeeUpdated { old: 100, new: 250 })
		);

		assert_eq!(
			gateway.set_fee_rate(OWNER, 501),
			Err(GatewayError::FeeExceedsLimit {
				provided: 501,
				ceiling: 500
			})
		);
		assert_eq!(gateway.fee_rate(), 250);
		assert!(events.try_recv().is_err());
	}

	#[test]
	fn test_pause_events_only_on_change() {
		let (mut gateway, _) = gateway_with(vec![fixed_endpoint(1, 10)]);
		let mut events = gateway.subscribe();

		assert_eq!(gateway.set_paused(OWNER, true), Ok(true));
		assert_eq!(gateway.set_paused(OWNER, true), Ok(false));
		assert_eq!(gateway.set_paused(OWNER, false), Ok(true));

		assert_eq!(
			events.try_recv().unwrap(),
			GatewayEvent::Pause(PauseEvent::Paused { account: OWNER })
		);
		assert_eq!(
			events.try_recv().unwrap(),
			GatewayEvent::Pause(PauseEvent::Unpaused { account: OWNER })
		);
		assert!(events.try_recv().is_err());
	}

	#[tokio::test]
	async fn test_withdraw_fees() {
		let (mut gateway, ledger) = gateway_with(vec![fixed_endpoint(1, 10)]);
		let asset = Address::repeat_byte(0xa1);

		assert_eq!(
			gateway.withdraw_fees(OWNER, asset).await,
			Err(GatewayError::NoFeesToWithdraw(asset))
		);

		ledger.mint(asset, GATEWAY, U256::from(7u64)).await.unwrap();
		assert_eq!(gateway.held_fees(asset).await, Ok(U256::from(7u64)));

		assert_eq!(gateway.withdraw_fees(OWNER, asset).await, Ok(U256::from(7u64)));
		assert_eq!(gateway.held_fees(asset).await, Ok(U256::ZERO));
		assert_eq!(ledger.balance_of(asset, OWNER).await.unwrap(), U256::from(7u64));
	}

	#[tokio::test]
	async fn test_admin_operations_work_while_paused() {
		let (mut gateway, ledger) = gateway_with(vec![fixed_endpoint(1, 10)]);
		let asset = Address::repeat_byte(0xa1);
		ledger.mint(asset, GATEWAY, U256::from(3u64)).await.unwrap();

		gateway.set_paused(OWNER, true).unwrap();
		gateway.set_fee_rate(OWNER, 20).unwrap();
		gateway.register_router(OWNER, fixed_endpoint(2, 10)).unwrap();
		gateway.deregister_router(OWNER, Address::repeat_byte(2)).unwrap();
		assert_eq!(gateway.withdraw_fees(OWNER, asset).await, Ok(U256::from(3u64)));
	}
}
