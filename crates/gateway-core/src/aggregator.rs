//! Best-execution quote aggregation across the registered endpoints.
//!
//! Every endpoint is asked for a quote concurrently, each bounded by a
//! timeout. Results are then folded in registry order, so ties always go to
//! the earlier endpoint no matter which answer arrived first. A failing,
//! empty, timed-out or panicking endpoint is logged and skipped.

use futures::future::join_all;
use futures::FutureExt;
use gateway_registry::RouterRegistry;
use gateway_types::{final_amount, Address, Quote, U256};
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct QuoteAggregator {
	timeout: Duration,
}

impl QuoteAggregator {
	pub fn new(timeout: Duration) -> Self {
		Self { timeout }
	}

	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	/// Returns the endpoint offering the highest output for `amount_in` along
	/// `path`, or `(None, 0)` when no endpoint produced a usable quote.
	pub async fn best_quote(
		&self,
		registry: &RouterRegistry,
		amount_in: U256,
		path: &[Address],
	) -> Quote {
		let requests = registry.iter().map(|endpoint| async move {
			let router = endpoint.address();
			let request = timeout(self.timeout, endpoint.quote(amount_in, path));
			(router, AssertUnwindSafe(request).catch_unwind().await)
		});
		let responses = join_all(requests).await;

		let mut best = Quote::none();
		for (router, response) in responses {
			let amounts = match response {
				Ok(Ok(Ok(amounts))) => amounts,
				Ok(Ok(Err(e))) => {
					warn!(%router, error = %e, "Endpoint quote failed");
					continue;
				}
				Ok(Err(_)) => {
					warn!(%router, timeout_ms = self.timeout.as_millis() as u64, "Endpoint quote timed out");
					continue;
				}
				Err(panic) => {
					warn!(%router, reason = %panic_message(panic.as_ref()), "Endpoint quote panicked");
					continue;
				}
			};

			let Some(candidate) = final_amount(&amounts) else {
				warn!(%router, "Endpoint returned an empty quote");
				continue;
			};

			debug!(%router, %candidate, "Endpoint quote");
			if candidate > best.amount_out {
				best = Quote {
					router: Some(router),
					amount_out: candidate,
				};
			}
		}

		best
	}
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
	if let Some(message) = payload.downcast_ref::<&str>() {
		message.to_string()
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.clone()
	} else {
		"unknown panic".to_string()
	}
}
