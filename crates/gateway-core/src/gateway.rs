//! The gateway context: registry, fee policy, gates and the ledger it settles on.
//!
//! Every public mutating operation runs inside a ledger checkpoint. On success
//! the checkpoint is committed and the buffered events are published; on any
//! error or panic the checkpoint is rolled back and the buffered events are
//! dropped. An operation whose future is dropped before it settles leaves its
//! checkpoint open; the next operation (or [`Gateway::recover`]) rolls it back
//! before doing anything else.

use crate::access::{AuthorizationGate, PauseGate};
use crate::aggregator::{panic_message, QuoteAggregator};
use crate::fees::FeeEngine;
use crate::GatewayError;
use gateway_endpoint::EndpointInterface;
use gateway_ledger::{Checkpoint, LedgerInterface};
use gateway_registry::RouterRegistry;
use futures::FutureExt;
use gateway_types::{Address, BasisPoints, EventBus, GatewayEvent, Quote, U256};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, trace, warn};

/// Tunables of a gateway instance.
#[derive(Debug, Clone)]
pub struct GatewayOptions {
	/// Custody identity holding fees and in-flight assets.
	pub address: Address,
	pub fee_bps: BasisPoints,
	/// Amount used to pick an endpoint for liquidity removal.
	pub selection_amount: U256,
	pub quote_timeout: Duration,
	pub event_capacity: usize,
}

impl GatewayOptions {
	pub fn new(address: Address) -> Self {
		Self {
			address,
			fee_bps: 0,
			selection_amount: U256::from(1_000_000_000_000_000_000u64),
			quote_timeout: Duration::from_secs(2),
			event_capacity: 1_024,
		}
	}
}

pub struct Gateway {
	pub(crate) address: Address,
	pub(crate) registry: RouterRegistry,
	pub(crate) fees: FeeEngine,
	pub(crate) aggregator: QuoteAggregator,
	pub(crate) ledger: Arc<dyn LedgerInterface>,
	pub(crate) auth: Arc<dyn AuthorizationGate>,
	pub(crate) pause: Arc<dyn PauseGate>,
	pub(crate) selection_amount: U256,
	event_bus: EventBus,
	pending: Vec<GatewayEvent>,
	/// Checkpoint of the operation in flight, if any.
	open: Option<Checkpoint>,
}

impl Gateway {
	/// Creates a gateway whose registry is seeded with `initial_router`.
	pub fn new(
		options: GatewayOptions,
		initial_router: Arc<dyn EndpointInterface>,
		ledger: Arc<dyn LedgerInterface>,
		auth: Arc<dyn AuthorizationGate>,
		pause: Arc<dyn PauseGate>,
	) -> Result<Self, GatewayError> {
		Ok(Self {
			address: options.address,
			registry: RouterRegistry::new(initial_router)?,
			fees: FeeEngine::new(options.fee_bps)?,
			aggregator: QuoteAggregator::new(options.quote_timeout),
			ledger,
			auth,
			pause,
			selection_amount: options.selection_amount,
			event_bus: EventBus::new(options.event_capacity.max(1)),
			pending: Vec::new(),
			open: None,
		})
	}

	pub fn address(&self) -> Address {
		self.address
	}

	pub fn fee_rate(&self) -> BasisPoints {
		self.fees.rate()
	}

	pub fn is_paused(&self) -> bool {
		self.pause.is_paused()
	}

	/// Registered endpoint identities, in registry order.
	pub fn routers(&self) -> Vec<Address> {
		self.registry.addresses()
	}

	pub fn router_count(&self) -> usize {
		self.registry.len()
	}

	pub fn is_registered(&self, router: &Address) -> bool {
		self.registry.is_registered(router)
	}

	pub fn router_at(&self, index: usize) -> Result<Address, GatewayError> {
		Ok(self.registry.router_at(index)?.address())
	}

	/// Fees currently held by the gateway in `asset`.
	pub async fn held_fees(&self, asset: Address) -> Result<U256, GatewayError> {
		Ok(self.ledger.balance_of(asset, self.address).await?)
	}

	/// Best quote across the registered endpoints. Never fails; an unroutable
	/// request yields `(None, 0)`.
	pub async fn best_quote(&self, amount_in: U256, path: &[Address]) -> Quote {
		self.aggregator
			.best_quote(&self.registry, amount_in, path)
			.await
	}

	pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
		self.event_bus.subscribe()
	}

	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	pub(crate) fn ensure_admin(&self, caller: &Address) -> Result<(), GatewayError> {
		if !self.auth.is_authorized_admin(caller) {
			return Err(GatewayError::Unauthorized(*caller));
		}
		Ok(())
	}

	pub(crate) fn ensure_not_paused(&self) -> Result<(), GatewayError> {
		if self.pause.is_paused() {
			return Err(GatewayError::Paused);
		}
		Ok(())
	}

	pub(crate) fn registry_mut(&mut self) -> &mut RouterRegistry {
		&mut self.registry
	}

	pub(crate) fn endpoint(&self, router: &Address) -> Result<Arc<dyn EndpointInterface>, GatewayError> {
		self.registry
			.get(router)
			.ok_or(GatewayError::EndpointNotFound(*router))
	}

	/// Queues an event for publication once the running operation commits.
	pub(crate) fn emit(&mut self, event: GatewayEvent) {
		self.pending.push(event);
	}

	/// Whether an earlier operation was dropped before it settled.
	pub fn has_abandoned_operation(&self) -> bool {
		self.open.is_some()
	}

	/// Rolls back the checkpoint of an operation whose future was dropped
	/// before it settled. Returns whether there was one.
	pub async fn recover(&mut self) -> Result<bool, GatewayError> {
		let Some(checkpoint) = self.open.take() else {
			return Ok(false);
		};

		warn!(depth = checkpoint.0, "Rolling back abandoned operation");
		self.pending.clear();
		self.ledger.rollback(checkpoint).await?;
		Ok(true)
	}

	/// Opens the ledger checkpoint of a public operation.
	pub(crate) async fn begin(&mut self) -> Result<Checkpoint, GatewayError> {
		self.recover().await?;
		self.pending.clear();
		let checkpoint = self.ledger.checkpoint().await?;
		self.open = Some(checkpoint);
		Ok(checkpoint)
	}

	/// Commits and publishes on success, rolls back and discards on failure.
	/// A commit the ledger refuses is treated as a failure.
	pub(crate) async fn settle<T>(
		&mut self,
		checkpoint: Checkpoint,
		result: Result<T, GatewayError>,
	) -> Result<T, GatewayError> {
		let outcome = match result {
			Ok(value) => self
				.ledger
				.commit(checkpoint)
				.await
				.map(|()| value)
				.map_err(GatewayError::from),
			Err(e) => Err(e),
		};

		match outcome {
			Ok(value) => {
				self.open = None;
				self.publish_pending();
				Ok(value)
			}
			Err(e) => {
				self.pending.clear();
				error!(error = %e, "Operation failed, rolling back");
				if let Err(rollback) = self.ledger.rollback(checkpoint).await {
					error!(error = %rollback, "Ledger rollback failed");
				}
				self.open = None;
				Err(e)
			}
		}
	}

	/// Publishes the queued events.
	pub(crate) fn publish_pending(&mut self) {
		for event in self.pending.drain(..) {
			// No subscribers is not an error.
			if self.event_bus.publish(event).is_err() {
				trace!("No event subscribers");
			}
		}
	}
}

/// Runs the body of an operation, turning a panic into
/// [`GatewayError::Aborted`] so the caller can still settle.
pub(crate) async fn catch_panics<T>(
	operation: impl Future<Output = Result<T, GatewayError>>,
) -> Result<T, GatewayError> {
	match AssertUnwindSafe(operation).catch_unwind().await {
		Ok(result) => result,
		Err(panic) => Err(GatewayError::Aborted(panic_message(panic.as_ref()))),
	}
}

/// Rejects paths that cannot describe a trade.
pub(crate) fn validate_path(path: &[Address]) -> Result<(), GatewayError> {
	if path.len() < 2 {
		warn!(len = path.len(), "Rejected path");
		return Err(GatewayError::InvalidPath(path.len()));
	}
	Ok(())
}

impl fmt::Debug for Gateway {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Gateway")
			.field("address", &self.address)
			.field("registry", &self.registry)
			.field("fee_bps", &self.fees.rate())
			.field("paused", &self.pause.is_paused())
			.finish()
	}
}
