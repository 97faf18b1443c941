use serde::{Deserialize, Serialize};

use crate::{Address, U256};

/// Result of a best-execution aggregation.
///
/// A quote with no router is a valid outcome: it means no whitelisted endpoint
/// could price the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Quote {
	/// Endpoint offering the best output, if any.
	pub router: Option<Address>,
	/// Best output amount, zero when no router was found.
	#[serde(rename = "amountOut", with = "crate::api::u256_serde")]
	pub amount_out: U256,
}

impl Quote {
	pub fn none() -> Self {
		Self::default()
	}

	pub fn is_routable(&self) -> bool {
		self.router.is_some()
	}
}
