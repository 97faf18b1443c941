//! API types for the gateway HTTP API.
//!
//! Amounts travel as decimal strings so that full `U256` precision survives
//! JSON clients. Request bodies never name the acting account; the server
//! derives it from the request's credentials.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{BasisPoints, Timestamp};

/// Request for a best-execution quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
	#[serde(rename = "amountIn", with = "u256_serde")]
	pub amount_in: U256,
	pub path: Vec<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapRequest {
	#[serde(rename = "amountIn", with = "u256_serde")]
	pub amount_in: U256,
	#[serde(rename = "minAmountOut", with = "u256_serde")]
	pub min_amount_out: U256,
	pub path: Vec<Address>,
	pub deadline: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapResponse {
	#[serde(rename = "amountOut", with = "u256_serde")]
	pub amount_out: U256,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddLiquidityRequest {
	#[serde(rename = "amountIn", with = "u256_serde")]
	pub amount_in: U256,
	#[serde(rename = "minAmountOut", with = "u256_serde")]
	pub min_amount_out: U256,
	pub path: Vec<Address>,
	#[serde(rename = "minAmountA", with = "u256_serde")]
	pub min_amount_a: U256,
	#[serde(rename = "minAmountB", with = "u256_serde")]
	pub min_amount_b: U256,
	pub deadline: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveLiquidityRequest {
	#[serde(rename = "tokenA")]
	pub token_a: Address,
	#[serde(rename = "tokenB")]
	pub token_b: Address,
	#[serde(with = "u256_serde")]
	pub liquidity: U256,
	#[serde(rename = "minAmountA", with = "u256_serde")]
	pub min_amount_a: U256,
	#[serde(rename = "minAmountB", with = "u256_serde")]
	pub min_amount_b: U256,
	pub recipient: Address,
	pub deadline: Timestamp,
}

/// Outcome of a liquidity operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityResponse {
	#[serde(rename = "amountA", with = "u256_serde")]
	pub amount_a: U256,
	#[serde(rename = "amountB", with = "u256_serde")]
	pub amount_b: U256,
	#[serde(with = "u256_serde")]
	pub shares: U256,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutersResponse {
	pub routers: Vec<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeStatusResponse {
	#[serde(rename = "feeBps")]
	pub fee_bps: BasisPoints,
	#[serde(rename = "maxFeeBps")]
	pub max_fee_bps: BasisPoints,
	pub paused: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetFeeRequest {
	#[serde(rename = "feeBps")]
	pub fee_bps: BasisPoints,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetPausedRequest {
	pub paused: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawFeesRequest {
	pub asset: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawFeesResponse {
	#[serde(with = "u256_serde")]
	pub amount: U256,
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
}

/// Serde module for U256 serialization/deserialization as decimal strings.
pub mod u256_serde {
	use alloy_primitives::U256;
	use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

	pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		value.to_string().serialize(serializer)
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		U256::from_str_radix(&s, 10).map_err(D::Error::custom)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_swap_request_amounts_are_decimal_strings() {
		let json = r#"{
			"amountIn": "100",
			"minAmountOut": "90",
			"path": [
				"0x2222222222222222222222222222222222222222",
				"0x3333333333333333333333333333333333333333"
			],
			"deadline": 1700000000
		}"#;

		let request: SwapRequest = serde_json::from_str(json).unwrap();
		assert_eq!(request.amount_in, U256::from(100u64));
		assert_eq!(request.min_amount_out, U256::from(90u64));
		assert_eq!(request.path.len(), 2);

		let encoded = serde_json::to_value(&request).unwrap();
		assert_eq!(encoded["amountIn"], "100");
	}

	#[test]
	fn test_hex_amount_rejected() {
		let json = r#"{ "amountIn": "0x10", "path": [] }"#;
		assert!(serde_json::from_str::<QuoteRequest>(json).is_err());
	}
}
