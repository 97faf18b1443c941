//! Serde helpers for configuration deserialization

use gateway_types::U256;
use serde::{Deserialize, Deserializer, Serializer};
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
	Integer(u64),
	Text(String),
}

/// Deserializes a `U256` written as an integer, a decimal string or a `0x` hex string
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
	D: Deserializer<'de>,
{
	match RawAmount::deserialize(deserializer)? {
		RawAmount::Integer(v) => Ok(U256::from(v)),
		RawAmount::Text(s) => U256::from_str(s.trim())
			.map_err(|e| serde::de::Error::custom(format!("Invalid amount '{}': {}", s, e))),
	}
}

/// Serializes a `U256` as a decimal string
pub fn serialize_amount<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	serializer.serialize_str(&value.to_string())
}

/// Default for implementation-specific tables
pub fn empty_table() -> toml::Value {
	toml::Value::Table(toml::map::Map::new())
}
