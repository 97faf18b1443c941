// gateway-core/src/error.rs

use gateway_endpoint::EndpointError;
use gateway_ledger::LedgerError;
use gateway_registry::RegistryError;
use gateway_types::{Address, BasisPoints, U256};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
	#[error("Fee rate {provided} bps exceeds the ceiling of {ceiling} bps")]
	FeeExceedsLimit {
		provided: BasisPoints,
		ceiling: BasisPoints,
	},

	#[error("Invalid endpoint identity: zero address")]
	InvalidEndpointIdentity,

	#[error("Endpoint {0} is not registered")]
	EndpointNotFound(Address),

	#[error("Index {index} out of range for {len} registered endpoints")]
	IndexOutOfRange { index: usize, len: usize },

	#[error("Invalid path: expected at least 2 assets, got {0}")]
	InvalidPath(usize),

	#[error("No valid router")]
	NoValidRouter,

	#[error("No pair for {token_a} and {token_b}")]
	PairNotFound { token_a: Address, token_b: Address },

	#[error("Insufficient output: quoted {quoted}, minimum {minimum}")]
	InsufficientOutput { quoted: U256, minimum: U256 },

	#[error("Gateway is paused")]
	Paused,

	#[error("No fees to withdraw for {0}")]
	NoFeesToWithdraw(Address),

	#[error("Caller {0} is not authorized")]
	Unauthorized(Address),

	#[error("Operation aborted: {0}")]
	Aborted(String),

	#[error("Ledger error: {0}")]
	Ledger(#[from] LedgerError),

	#[error("Endpoint error: {0}")]
	Endpoint(#[from] EndpointError),
}

/// Coarse classification of gateway failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	Configuration,
	Routing,
	Slippage,
	State,
	Authorization,
	External,
}

impl GatewayError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::FeeExceedsLimit { .. }
			| Self::InvalidEndpointIdentity
			| Self::EndpointNotFound(_)
			| Self::IndexOutOfRange { .. }
			| Self::InvalidPath(_) => ErrorKind::Configuration,
			Self::NoValidRouter | Self::PairNotFound { .. } => ErrorKind::Routing,
			Self::InsufficientOutput { .. } => ErrorKind::Slippage,
			Self::Paused | Self::NoFeesToWithdraw(_) => ErrorKind::State,
			Self::Unauthorized(_) => ErrorKind::Authorization,
			Self::Aborted(_) | Self::Ledger(_) | Self::Endpoint(_) => ErrorKind::External,
		}
	}
}

impl From<RegistryError> for GatewayError {
	fn from(err: RegistryError) -> Self {
		match err {
			RegistryError::InvalidIdentity => Self::InvalidEndpointIdentity,
			RegistryError::NotFound(address) => Self::EndpointNotFound(address),
			RegistryError::IndexOutOfRange { index, len } => Self::IndexOutOfRange { index, len },
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_registry_errors_map_to_configuration() {
		let err: GatewayError = RegistryError::NotFound(Address::repeat_byte(1)).into();
		assert_eq!(err, GatewayError::EndpointNotFound(Address::repeat_byte(1)));
		assert_eq!(err.kind(), ErrorKind::Configuration);

		let err: GatewayError = RegistryError::InvalidIdentity.into();
		assert_eq!(err.kind(), ErrorKind::Configuration);
	}

	#[test]
	fn test_collaborator_errors_are_external() {
		let err: GatewayError = LedgerError::Backend("down".into()).into();
		assert_eq!(err.kind(), ErrorKind::External);

		let err: GatewayError = EndpointError::InsufficientLiquidity.into();
		assert_eq!(err.kind(), ErrorKind::External);

		assert_eq!(GatewayError::Paused.kind(), ErrorKind::State);
		assert_eq!(
			GatewayError::Unauthorized(Address::ZERO).kind(),
			ErrorKind::Authorization
		);
	}
}
