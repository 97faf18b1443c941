#![allow(dead_code)]

use gateway_core::{FlagPauseGate, Gateway, GatewayOptions, OwnerGate};
use gateway_endpoint::implementations::constant_product::ConstantProductEndpoint;
use gateway_endpoint::EndpointInterface;
use gateway_ledger::implementations::memory::MemoryLedger;
use gateway_ledger::LedgerInterface;
use gateway_types::{Address, ManualClock, Timestamp, U256};
use std::sync::Arc;
use std::time::Duration;

pub const OWNER: Address = Address::repeat_byte(0x0a);
pub const GATEWAY: Address = Address::repeat_byte(0x0b);
pub const TRADER: Address = Address::repeat_byte(0x07);
pub const TOKEN_A: Address = Address::repeat_byte(0xa1);
pub const TOKEN_B: Address = Address::repeat_byte(0xb2);
pub const TOKEN_C: Address = Address::repeat_byte(0xc3);
pub const ALPHA: Address = Address::repeat_byte(0x31);
pub const BETA: Address = Address::repeat_byte(0x32);
pub const GAMMA: Address = Address::repeat_byte(0x33);
pub const NOW: Timestamp = 1_700_000_000;

pub fn units(v: u64) -> U256 {
	U256::from(v)
}

/// Two priced endpoints and one without any pool:
/// - alpha: A/B at 1:1 and B/C at 1:1
/// - beta: A/B at 1:2, so it quotes more B per A than alpha
/// - gamma: no pools, every quote fails
pub struct Harness {
	pub gateway: Gateway,
	pub ledger: Arc<MemoryLedger>,
	pub clock: Arc<ManualClock>,
	pub alpha: Arc<ConstantProductEndpoint>,
	pub beta: Arc<ConstantProductEndpoint>,
}

pub async fn harness(fee_bps: u16) -> Harness {
	let ledger = Arc::new(MemoryLedger::new());
	let clock = Arc::new(ManualClock::new(NOW));

	let alpha = Arc::new(ConstantProductEndpoint::new(
		ALPHA,
		30,
		ledger.clone(),
		clock.clone(),
	));
	alpha
		.seed_pool(TOKEN_A, TOKEN_B, units(1_000_000), units(1_000_000), ALPHA)
		.await
		.unwrap();
	alpha
		.seed_pool(TOKEN_B, TOKEN_C, units(1_000_000), units(1_000_000), ALPHA)
		.await
		.unwrap();

	let beta = Arc::new(ConstantProductEndpoint::new(
		BETA,
		30,
		ledger.clone(),
		clock.clone(),
	));
	beta.seed_pool(TOKEN_A, TOKEN_B, units(1_000_000), units(2_000_000), BETA)
		.await
		.unwrap();

	let gamma = Arc::new(ConstantProductEndpoint::new(
		GAMMA,
		30,
		ledger.clone(),
		clock.clone(),
	));

	let mut options = GatewayOptions::new(GATEWAY);
	options.fee_bps = fee_bps;
	options.quote_timeout = Duration::from_millis(500);

	let mut gateway = Gateway::new(
		options,
		gamma,
		ledger.clone(),
		Arc::new(OwnerGate::new(OWNER)),
		Arc::new(FlagPauseGate::default()),
	)
	.unwrap();
	gateway
		.register_router(OWNER, alpha.clone() as Arc<dyn EndpointInterface>)
		.unwrap();
	gateway
		.register_router(OWNER, beta.clone() as Arc<dyn EndpointInterface>)
		.unwrap();

	Harness {
		gateway,
		ledger,
		clock,
		alpha,
		beta,
	}
}

pub async fn fund(ledger: &MemoryLedger, asset: Address, account: Address, amount: U256) {
	ledger.mint(asset, account, amount).await.unwrap();
	ledger
		.approve(asset, account, GATEWAY, amount)
		.await
		.unwrap();
}

/// Balances of every asset and participant the suite touches.
pub async fn snapshot(harness: &Harness) -> Vec<U256> {
	let mut balances = Vec::new();
	for asset in [TOKEN_A, TOKEN_B, TOKEN_C] {
		for account in [TRADER, GATEWAY, OWNER] {
			balances.push(harness.ledger.balance_of(asset, account).await.unwrap());
		}
	}
	for endpoint in [&harness.alpha, &harness.beta] {
		let pair = endpoint.factory().pair_for(TOKEN_A, TOKEN_B).unwrap();
		balances.push(harness.ledger.balance_of(TOKEN_A, pair).await.unwrap());
		balances.push(harness.ledger.balance_of(TOKEN_B, pair).await.unwrap());
		balances.push(harness.ledger.balance_of(pair, TRADER).await.unwrap());
	}
	balances
}
