//! Configuration types for the gateway.

use crate::serde_helpers;
use gateway_types::{Address, BasisPoints, U256};
use serde::{Deserialize, Serialize};

/// Complete gateway configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Gateway identity and policy
	pub gateway: GatewaySettings,
	/// Asset ledger backend
	#[serde(default)]
	pub ledger: LedgerConfig,
	/// Whitelisted liquidity endpoints; the first entry seeds the registry
	pub endpoints: Vec<EndpointConfig>,
	/// HTTP API
	#[serde(default)]
	pub api: ApiConfig,
}

/// Gateway identity and policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewaySettings {
	/// Gateway name for logging
	pub name: String,
	/// Custody identity holding fees and in-flight assets
	pub address: Address,
	/// Administrator allowed to change configuration
	pub owner: Address,
	/// Fee rate in basis points
	#[serde(default)]
	pub fee_bps: BasisPoints,
	/// Quote size used to pick an endpoint for liquidity removal
	#[serde(
		default = "default_selection_amount",
		deserialize_with = "serde_helpers::deserialize_amount",
		serialize_with = "serde_helpers::serialize_amount"
	)]
	pub selection_amount: U256,
	/// Upper bound for a single endpoint quote
	#[serde(default = "default_quote_timeout_ms")]
	pub quote_timeout_ms: u64,
	/// Capacity of the event broadcast channel
	#[serde(default = "default_event_capacity")]
	pub event_capacity: usize,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

/// Asset ledger backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
	#[serde(default = "default_ledger_backend")]
	pub backend: String,
	/// Backend-specific settings
	#[serde(default = "serde_helpers::empty_table")]
	pub config: toml::Value,
}

impl Default for LedgerConfig {
	fn default() -> Self {
		Self {
			backend: default_ledger_backend(),
			config: serde_helpers::empty_table(),
		}
	}
}

/// A whitelisted endpoint and the implementation backing it
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointConfig {
	/// Unique name for logging
	pub name: String,
	/// Implementation key, e.g. `constant_product`
	pub implementation: String,
	/// Implementation-specific settings
	#[serde(default = "serde_helpers::empty_table")]
	pub config: toml::Value,
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	#[serde(default = "default_api_host")]
	pub host: String,
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Bearer tokens accepted on mutating routes, each acting as one account.
	///
	/// Tokens are secrets; load them through `${VAR}` substitution rather
	/// than committing them.
	#[serde(default)]
	pub keys: Vec<ApiKey>,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			host: default_api_host(),
			port: default_api_port(),
			keys: Vec::new(),
		}
	}
}

/// Credential binding a bearer token to the account it acts as.
#[derive(Clone, Deserialize, Serialize)]
pub struct ApiKey {
	pub token: String,
	pub account: Address,
}

impl std::fmt::Debug for ApiKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ApiKey")
			.field("token", &"<redacted>")
			.field("account", &self.account)
			.finish()
	}
}

fn default_selection_amount() -> U256 {
	// One whole unit of an 18-decimals asset.
	U256::from(1_000_000_000_000_000_000u64)
}

fn default_quote_timeout_ms() -> u64 {
	2_000
}

fn default_event_capacity() -> usize {
	1_024
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_ledger_backend() -> String {
	"memory".to_string()
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	8080
}
