//! Router registry for the gateway.
//!
//! The registry holds the whitelist of liquidity endpoints the gateway may
//! route through. Endpoints are kept in an indexable sequence alongside an
//! identity-to-index map, so membership checks are constant time and the
//! ordered view always agrees with membership.
//!
//! # Thread Safety
//!
//! The registry itself is not thread-safe. Mutations go through the owning
//! gateway context, which is serialized by the service layer.

use gateway_endpoint::EndpointInterface;
use gateway_types::Address;
use std::{collections::HashMap, fmt, sync::Arc};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during registry operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
	#[error("Invalid endpoint identity: zero address")]
	InvalidIdentity,
	#[error("Endpoint {0} is not registered")]
	NotFound(Address),
	#[error("Index {index} out of range for {len} registered endpoints")]
	IndexOutOfRange { index: usize, len: usize },
}

/// Whitelist of liquidity endpoints.
pub struct RouterRegistry {
	routers: Vec<Arc<dyn EndpointInterface>>,
	index: HashMap<Address, usize>,
}

impl RouterRegistry {
	/// Creates a registry seeded with its mandatory first endpoint.
	pub fn new(initial: Arc<dyn EndpointInterface>) -> Result<Self, RegistryError> {
		let mut registry = Self {
			routers: Vec::new(),
			index: HashMap::new(),
		};
		registry.register(initial)?;
		Ok(registry)
	}

	/// Adds an endpoint to the whitelist.
	///
	/// Returns `Ok(false)` without changing anything if the endpoint is already
	/// registered.
	pub fn register(&mut self, endpoint: Arc<dyn EndpointInterface>) -> Result<bool, RegistryError> {
		let address = endpoint.address();
		if address.is_zero() {
			return Err(RegistryError::InvalidIdentity);
		}

		if self.index.contains_key(&address) {
			debug!(router = %address, "Router already registered");
			return Ok(false);
		}

		self.index.insert(address, self.routers.len());
		self.routers.push(endpoint);
		info!(router = %address, total = self.routers.len(), "Registered router");
		Ok(true)
	}

	/// Removes an endpoint from the whitelist.
	///
	/// The last endpoint takes the removed one's slot, so ordering is not
	/// preserved.
	pub fn deregister(&mut self, address: &Address) -> Result<Arc<dyn EndpointInterface>, RegistryError> {
		let position = self
			.index
			.remove(address)
			.ok_or(RegistryError::NotFound(*address))?;

		let removed = self.routers.swap_remove(position);
		if let Some(moved) = self.routers.get(position) {
			self.index.insert(moved.address(), position);
		}

		info!(router = %address, total = self.routers.len(), "Deregistered router");
		Ok(removed)
	}

	pub fn is_registered(&self, address: &Address) -> bool {
		self.index.contains_key(address)
	}

	/// Returns the endpoint at `index` in the current ordering.
	pub fn router_at(&self, index: usize) -> Result<Arc<dyn EndpointInterface>, RegistryError> {
		self.routers
			.get(index)
			.cloned()
			.ok_or(RegistryError::IndexOutOfRange {
				index,
				len: self.routers.len(),
			})
	}

	pub fn get(&self, address: &Address) -> Option<Arc<dyn EndpointInterface>> {
		self.index
			.get(address)
			.map(|position| self.routers[*position].clone())
	}

	pub fn len(&self) -> usize {
		self.routers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.routers.is_empty()
	}

	/// Iterates the endpoints in registry order.
	pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn EndpointInterface>> {
		self.routers.iter()
	}

	/// Identities of the registered endpoints, in registry order.
	pub fn addresses(&self) -> Vec<Address> {
		self.routers.iter().map(|r| r.address()).collect()
	}
}

impl fmt::Debug for RouterRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouterRegistry")
			.field("routers", &self.addresses())
			.finish()
	}
}
