//! Authorization and pause gates consulted by the gateway.

use gateway_types::Address;
use std::sync::atomic::{AtomicBool, Ordering};

/// Decides which callers may perform administrative operations.
pub trait AuthorizationGate: Send + Sync {
	fn is_authorized_admin(&self, caller: &Address) -> bool;
}

/// Single-owner authorization.
#[derive(Debug, Clone)]
pub struct OwnerGate {
	owner: Address,
}

impl OwnerGate {
	pub fn new(owner: Address) -> Self {
		Self { owner }
	}

	pub fn owner(&self) -> Address {
		self.owner
	}
}

impl AuthorizationGate for OwnerGate {
	fn is_authorized_admin(&self, caller: &Address) -> bool {
		*caller == self.owner
	}
}

/// Process-wide pause switch for trading and liquidity operations.
pub trait PauseGate: Send + Sync {
	fn is_paused(&self) -> bool;

	/// Sets the flag and returns its previous value.
	fn set_paused(&self, paused: bool) -> bool;
}

#[derive(Debug, Default)]
pub struct FlagPauseGate {
	paused: AtomicBool,
}

impl FlagPauseGate {
	pub fn new(paused: bool) -> Self {
		Self {
			paused: AtomicBool::new(paused),
		}
	}
}

impl PauseGate for FlagPauseGate {
	fn is_paused(&self) -> bool {
		self.paused.load(Ordering::SeqCst)
	}

	fn set_paused(&self, paused: bool) -> bool {
		self.paused.swap(paused, Ordering::SeqCst)
	}
}
