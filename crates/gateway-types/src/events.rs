//! Gateway events and the broadcast bus they are published on.
//!
//! Events are only published once the operation that produced them has been
//! committed, so observers never see events of a rolled-back call.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::{Address, BasisPoints, U256};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayEvent {
	Registry(RegistryEvent),
	Fee(FeeEvent),
	Trade(TradeEvent),
	Pause(PauseEvent),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
	RouterRegistered { router: Address },
	RouterDeregistered { router: Address },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeEvent {
	FeeUpdated {
		old: BasisPoints,
		new: BasisPoints,
	},
	FeesWithdrawn {
		asset: Address,
		amount: U256,
		to: Address,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeEvent {
	SwapCompleted {
		token_in: Address,
		token_out: Address,
		amount_in: U256,
		amount_out: U256,
	},
	LiquidityAdded {
		token_a: Address,
		token_b: Address,
		amount_a: U256,
		amount_b: U256,
		shares: U256,
	},
	LiquidityRemoved {
		token_a: Address,
		token_b: Address,
		amount_a: U256,
		amount_b: U256,
		shares: U256,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PauseEvent {
	Paused { account: Address },
	Unpaused { account: Address },
}

/// Event bus for broadcasting gateway events to multiple subscribers.
pub struct EventBus {
	sender: broadcast::Sender<GatewayEvent>,
}

impl EventBus {
	/// Creates a new EventBus with the specified channel capacity.
	///
	/// The capacity determines how many events can be buffered before slow
	/// subscribers start lagging.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event to all current subscribers.
	///
	/// Returns an error if there are no active subscribers.
	pub fn publish(
		&self,
		event: GatewayEvent,
	) -> Result<(), broadcast::error::SendError<GatewayEvent>> {
		self.sender.send(event)?;
		Ok(())
	}
}

impl Clone for EventBus {
	fn clone(&self) -> Self {
		Self {
			sender: self.sender.clone(),
		}
	}
}
