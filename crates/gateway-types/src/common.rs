//! Common types used throughout the gateway.

use std::sync::atomic::{AtomicU64, Ordering};

// Re-export commonly used ethereum types
pub use alloy_primitives::{keccak256, Address, U256};

/// Timestamp (Unix seconds)
pub type Timestamp = u64;

/// Fee rates and other proportions, in basis points (1 = 0.01%).
pub type BasisPoints = u16;

/// Denominator for basis-point arithmetic.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Highest fee rate the gateway accepts, 5%.
pub const MAX_FEE_BPS: BasisPoints = 500;

/// Ordered asset path of a trade. The first element is the input asset and the
/// last element is the output asset.
pub type AssetPath = Vec<Address>;

/// Source of the current time used for deadline checks.
pub trait Clock: Send + Sync {
	fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> Timestamp {
		chrono::Utc::now().timestamp().max(0) as Timestamp
	}
}

/// Clock that only moves when told to. Used by simulations and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
	now: AtomicU64,
}

impl ManualClock {
	pub fn new(now: Timestamp) -> Self {
		Self {
			now: AtomicU64::new(now),
		}
	}

	pub fn set(&self, now: Timestamp) {
		self.now.store(now, Ordering::SeqCst);
	}

	pub fn advance(&self, seconds: u64) {
		self.now.fetch_add(seconds, Ordering::SeqCst);
	}
}

impl Clock for ManualClock {
	fn now(&self) -> Timestamp {
		self.now.load(Ordering::SeqCst)
	}
}

/// Returns the last amount of an amount sequence, i.e. the output of a multi-hop
/// quote or swap.
pub fn final_amount(amounts: &[U256]) -> Option<U256> {
	amounts.last().copied()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_manual_clock() {
		let clock = ManualClock::new(100);
		assert_eq!(clock.now(), 100);

		clock.advance(20);
		assert_eq!(clock.now(), 120);

		clock.set(5);
		assert_eq!(clock.now(), 5);
	}

	#[test]
	fn test_final_amount() {
		assert_eq!(final_amount(&[]), None);
		assert_eq!(
			final_amount(&[U256::from(10u64), U256::from(7u64)]),
			Some(U256::from(7u64))
		);
	}
}
