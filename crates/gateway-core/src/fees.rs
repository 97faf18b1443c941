//! Fee engine: the gateway's cut of every trade and liquidity deposit.

use crate::GatewayError;
use gateway_types::{BasisPoints, BPS_DENOMINATOR, MAX_FEE_BPS, U256};

/// Result of splitting a gross amount into fee and net parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSplit {
	pub fee: U256,
	pub net: U256,
}

/// Computes `floor(gross * rate / 10000)` without an intermediate product
/// that could overflow.
pub fn compute_fee(gross: U256, rate: BasisPoints) -> FeeSplit {
	let denominator = U256::from(BPS_DENOMINATOR);
	let rate = U256::from(rate);

	// gross = q * 10000 + m, so gross * rate / 10000 = q * rate + m * rate / 10000
	let q = gross / denominator;
	let m = gross % denominator;
	let fee = q * rate + m * rate / denominator;

	FeeSplit {
		fee,
		net: gross - fee,
	}
}

#[derive(Debug, Clone)]
pub struct FeeEngine {
	rate: BasisPoints,
}

impl FeeEngine {
	pub fn new(rate: BasisPoints) -> Result<Self, GatewayError> {
		check_rate(rate)?;
		Ok(Self { rate })
	}

	pub fn rate(&self) -> BasisPoints {
		self.rate
	}

	pub fn compute_fee(&self, gross: U256) -> FeeSplit {
		compute_fee(gross, self.rate)
	}

	/// Replaces the rate and returns the previous one. Leaves the rate
	/// untouched when `new_rate` is above the ceiling.
	pub fn set_rate(&mut self, new_rate: BasisPoints) -> Result<BasisPoints, GatewayError> {
		check_rate(new_rate)?;
		Ok(std::mem::replace(&mut self.rate, new_rate))
	}
}

fn check_rate(rate: BasisPoints) -> Result<(), GatewayError> {
	if rate > MAX_FEE_BPS {
		return Err(GatewayError::FeeExceedsLimit {
			provided: rate,
			ceiling: MAX_FEE_BPS,
		});
	}
	Ok(())
}
