//! Assembles a [`Gateway`] from configuration.
//!
//! Backends are plugged in through named factories, so the configuration only
//! refers to an implementation key and an opaque table of settings.

use crate::access::{AuthorizationGate, FlagPauseGate, OwnerGate, PauseGate};
use crate::gateway::{Gateway, GatewayOptions};
use crate::GatewayError;
use futures::future::BoxFuture;
use futures::FutureExt;
use gateway_config::Config;
use gateway_endpoint::{implementations::constant_product, EndpointError, EndpointInterface};
use gateway_ledger::{implementations::memory, LedgerInterface};
use gateway_types::{Clock, SystemClock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum BuildError {
	#[error("Configuration error: {0}")]
	Config(String),

	#[error("No {kind} implementation named '{name}'")]
	UnknownImplementation { kind: &'static str, name: String },

	#[error("Endpoint '{name}' failed to start: {source}")]
	Endpoint {
		name: String,
		#[source]
		source: EndpointError,
	},

	#[error("Gateway error: {0}")]
	Gateway(#[from] GatewayError),
}

// Type aliases for factory functions
pub type LedgerFactory =
	Box<dyn Fn(&toml::Value) -> Result<Arc<dyn LedgerInterface>, BuildError> + Send + Sync>;
pub type EndpointFactory = Box<
	dyn Fn(
			toml::Value,
			Arc<dyn LedgerInterface>,
			Arc<dyn Clock>,
		) -> BoxFuture<'static, Result<Arc<dyn EndpointInterface>, EndpointError>>
		+ Send
		+ Sync,
>;

pub struct GatewayBuilder {
	config: Config,
	clock: Arc<dyn Clock>,
	ledger_factories: HashMap<String, LedgerFactory>,
	endpoint_factories: HashMap<String, EndpointFactory>,
	auth: Option<Arc<dyn AuthorizationGate>>,
	pause: Option<Arc<dyn PauseGate>>,
}

/// A built gateway together with the ledger it settles on.
pub struct BuiltGateway {
	pub gateway: Gateway,
	pub ledger: Arc<dyn LedgerInterface>,
}

impl GatewayBuilder {
	pub fn new(config: Config) -> Self {
		Self {
			config,
			clock: Arc::new(SystemClock),
			ledger_factories: HashMap::new(),
			endpoint_factories: HashMap::new(),
			auth: None,
			pause: None,
		}
	}

	/// Builder with the bundled `memory` ledger and `constant_product` endpoint.
	pub fn with_defaults(config: Config) -> Self {
		Self::new(config)
			.with_ledger_factory("memory", |config| {
				let ledger = memory::create_ledger(config)
					.map_err(|e| BuildError::Config(format!("Invalid ledger configuration: {}", e)))?;
				Ok(ledger as Arc<dyn LedgerInterface>)
			})
			.with_endpoint_factory("constant_product", |config, ledger, clock| {
				async move {
					let endpoint = constant_product::create_endpoint(config, ledger, clock).await?;
					Ok::<_, EndpointError>(endpoint as Arc<dyn EndpointInterface>)
				}
				.boxed()
			})
	}

	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;
		self
	}

	pub fn with_ledger_factory<F>(mut self, name: &str, factory: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<Arc<dyn LedgerInterface>, BuildError> + Send + Sync + 'static,
	{
		self.ledger_factories
			.insert(name.to_string(), Box::new(factory));
		self
	}

	pub fn with_endpoint_factory<F>(mut self, name: &str, factory: F) -> Self
	where
		F: Fn(
				toml::Value,
				Arc<dyn LedgerInterface>,
				Arc<dyn Clock>,
			) -> BoxFuture<'static, Result<Arc<dyn EndpointInterface>, EndpointError>>
			+ Send
			+ Sync
			+ 'static,
	{
		self.endpoint_factories
			.insert(name.to_string(), Box::new(factory));
		self
	}

	/// Overrides the owner-based authorization derived from configuration.
	pub fn with_authorization(mut self, auth: Arc<dyn AuthorizationGate>) -> Self {
		self.auth = Some(auth);
		self
	}

	pub fn with_pause_gate(mut self, pause: Arc<dyn PauseGate>) -> Self {
		self.pause = Some(pause);
		self
	}

	pub async fn build(self) -> Result<BuiltGateway, BuildError> {
		let settings = &self.config.gateway;

		// Create the ledger
		let ledger_factory = self
			.ledger_factories
			.get(&self.config.ledger.backend)
			.ok_or_else(|| BuildError::UnknownImplementation {
				kind: "ledger",
				name: self.config.ledger.backend.clone(),
			})?;
		let ledger = ledger_factory(&self.config.ledger.config)?;

		// Create the endpoints, in configuration order
		let mut endpoints = Vec::with_capacity(self.config.endpoints.len());
		for endpoint_config in &self.config.endpoints {
			let factory = self
				.endpoint_factories
				.get(&endpoint_config.implementation)
				.ok_or_else(|| BuildError::UnknownImplementation {
					kind: "endpoint",
					name: endpoint_config.implementation.clone(),
				})?;

			let endpoint = factory(
				endpoint_config.config.clone(),
				ledger.clone(),
				self.clock.clone(),
			)
			.await
			.map_err(|source| BuildError::Endpoint {
				name: endpoint_config.name.clone(),
				source,
			})?;

			info!(
				name = %endpoint_config.name,
				implementation = %endpoint_config.implementation,
				address = %endpoint.address(),
				"Endpoint ready"
			);
			endpoints.push(endpoint);
		}

		let mut endpoints = endpoints.into_iter();
		let initial = endpoints
			.next()
			.ok_or_else(|| BuildError::Config("At least one endpoint must be configured".into()))?;

		let auth = self
			.auth
			.unwrap_or_else(|| Arc::new(OwnerGate::new(settings.owner)) as Arc<dyn AuthorizationGate>);
		let pause = self
			.pause
			.unwrap_or_else(|| Arc::new(FlagPauseGate::default()) as Arc<dyn PauseGate>);

		let options = GatewayOptions {
			address: settings.address,
			fee_bps: settings.fee_bps,
			selection_amount: settings.selection_amount,
			quote_timeout: Duration::from_millis(settings.quote_timeout_ms),
			event_capacity: settings.event_capacity,
		};
		let mut gateway = Gateway::new(options, initial, ledger.clone(), auth, pause)?;

		for endpoint in endpoints {
			let address = endpoint.address();
			if !gateway.registry_mut().register(endpoint).map_err(GatewayError::from)? {
				warn!(%address, "Endpoint configured twice, keeping the first entry");
			}
		}

		info!(
			name = %settings.name,
			address = %gateway.address(),
			routers = gateway.router_count(),
			fee_bps = gateway.fee_rate(),
			"Gateway built"
		);

		Ok(BuiltGateway { gateway, ledger })
	}
}
