use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gateway_config::{Config, ConfigLoader};
use gateway_core::{Gateway, GatewayBuilder};
use gateway_types::{Address, GatewayEvent, U256};
use std::path::PathBuf;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;

#[derive(Parser)]
#[command(name = "router-gateway")]
#[command(about = "Router aggregation and liquidity zapping gateway", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	#[arg(short, long, value_name = "FILE", default_value = "config/local.toml")]
	config: PathBuf,

	/// Overrides the log level from the configuration file
	#[arg(long, env = "GATEWAY_LOG_LEVEL")]
	log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
	/// Start the gateway service
	Start,
	/// Validate the configuration file
	Validate,
	/// Print the best quote across the configured endpoints
	Quote {
		/// Input amount, decimal or 0x-prefixed hex
		#[arg(long)]
		amount: U256,

		/// Comma separated asset path
		#[arg(long, value_delimiter = ',', required = true)]
		path: Vec<Address>,
	},
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	let config = ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.with_context(|| format!("Failed to load configuration from {:?}", cli.config))?;

	let log_level = cli
		.log_level
		.clone()
		.unwrap_or_else(|| config.gateway.log_level.clone());
	setup_tracing(&log_level)?;

	match &cli.command {
		Some(Commands::Start) | None => start_service(config).await,
		Some(Commands::Validate) => validate_config(&cli, &config),
		Some(Commands::Quote { amount, path }) => print_quote(config, *amount, path).await,
	}
}

async fn build_gateway(config: Config) -> Result<Gateway> {
	let built = GatewayBuilder::with_defaults(config)
		.build()
		.await
		.context("Failed to build gateway")?;
	Ok(built.gateway)
}

async fn start_service(config: Config) -> Result<()> {
	info!("Starting router gateway");
	info!("Gateway name: {}", config.gateway.name);
	info!("HTTP address: {}:{}", config.api.host, config.api.port);

	let api_config = config.api.clone();
	if api_config.keys.is_empty() {
		warn!("No API keys configured; every mutating route will be rejected");
	}
	let gateway = build_gateway(config).await?;

	let events = gateway.subscribe();
	let event_handle = tokio::spawn(log_events(events));

	let state = api::AppState::new(gateway, &api_config.keys);
	api::start_server(api_config, state, shutdown_signal())
		.await
		.context("HTTP server failed")?;

	event_handle.abort();
	info!("Router gateway stopped");
	Ok(())
}

fn validate_config(cli: &Cli, config: &Config) -> Result<()> {
	info!("Configuration file {:?} is valid", cli.config);
	info!("Gateway name: {}", config.gateway.name);
	info!("Gateway address: {}", config.gateway.address);
	info!("Owner: {}", config.gateway.owner);
	info!("Fee rate: {} bps", config.gateway.fee_bps);
	info!("Ledger backend: {}", config.ledger.backend);
	info!("API keys: {}", config.api.keys.len());
	info!("Endpoints:");
	for endpoint in &config.endpoints {
		info!("  {} ({})", endpoint.name, endpoint.implementation);
	}
	Ok(())
}

async fn print_quote(config: Config, amount: U256, path: &[Address]) -> Result<()> {
	let gateway = build_gateway(config).await?;
	let quote = gateway.best_quote(amount, path).await;
	if !quote.is_routable() {
		warn!("No endpoint could price the path");
	}
	println!("{}", serde_json::to_string_pretty(&quote)?);
	Ok(())
}

async fn log_events(mut events: broadcast::Receiver<GatewayEvent>) {
	loop {
		match events.recv().await {
			Ok(event) => info!(?event, "Gateway event"),
			Err(broadcast::error::RecvError::Lagged(skipped)) => {
				warn!(skipped, "Event logger lagged behind")
			}
			Err(broadcast::error::RecvError::Closed) => break,
		}
	}
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer())
		.try_init()
		.context("Failed to install tracing subscriber")?;

	Ok(())
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = signal::ctrl_c().await {
			error!("Failed to listen for Ctrl+C: {}", e);
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;
			}
			Err(e) => {
				error!("Failed to install SIGTERM handler: {}", e);
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}

	info!("Shutdown signal received");
}
