//! Configuration loading for the router gateway.
//!
//! Configuration files are TOML, JSON or YAML (picked by extension). `${VAR}`
//! references are substituted from the environment before parsing, a few
//! settings can then be overridden by prefixed environment variables, and the
//! result is validated before it is handed to the gateway builder.

use gateway_types::{Address, MAX_FEE_BPS};
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub mod serde_helpers;
pub mod types;

pub use types::*;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
	Toml,
	Json,
	Yaml,
}

impl ConfigFormat {
	/// Picks the format from a file extension.
	pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
		match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => Ok(Self::Toml),
			Some("json") => Ok(Self::Json),
			Some("yaml") | Some("yml") => Ok(Self::Yaml),
			_ => Err(ConfigError::ParseError(format!(
				"Unsupported config format: {:?}",
				path
			))),
		}
	}
}

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
	file_path: Option<PathBuf>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "GATEWAY_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_path_buf());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<Config, ConfigError> {
		let file_path = self.file_path.as_ref().ok_or_else(|| {
			ConfigError::FileNotFound("No configuration file specified".to_string())
		})?;

		if !tokio::fs::try_exists(file_path).await? {
			return Err(ConfigError::FileNotFound(
				file_path.display().to_string(),
			));
		}

		info!("Loading configuration from {:?}", file_path);
		let content = tokio::fs::read_to_string(file_path).await?;
		let format = ConfigFormat::from_path(file_path)?;

		let substituted = substitute_env_vars(&content)?;
		let mut config = parse(&substituted, format)?;

		self.apply_env_overrides(&mut config)?;
		validate_config(&config)?;

		Ok(config)
	}

	fn apply_env_overrides(&self, config: &mut Config) -> Result<(), ConfigError> {
		if let Ok(log_level) = env::var(format!("{}LOG_LEVEL", self.env_prefix)) {
			debug!("Overriding log level from environment");
			config.gateway.log_level = log_level;
		}

		if let Ok(fee_bps) = env::var(format!("{}FEE_BPS", self.env_prefix)) {
			debug!("Overriding fee rate from environment");
			config.gateway.fee_bps = fee_bps
				.parse()
				.map_err(|e| ConfigError::ValidationError(format!("Invalid fee rate: {}", e)))?;
		}

		if let Ok(api_port) = env::var(format!("{}API_PORT", self.env_prefix)) {
			debug!("Overriding API port from environment");
			config.api.port = api_port
				.parse()
				.map_err(|e| ConfigError::ValidationError(format!("Invalid API port: {}", e)))?;
		}

		Ok(())
	}
}

/// Parses configuration content without touching the environment.
pub fn parse(content: &str, format: ConfigFormat) -> Result<Config, ConfigError> {
	match format {
		ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
		ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
		ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
	}
	.map_err(ConfigError::ParseError)
}

/// Replaces every `${VAR_NAME}` with the value of that environment variable.
pub fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
	let re = regex::Regex::new(r"\$\{([^}]+)\}")
		.map_err(|e| ConfigError::ParseError(e.to_string()))?;

	let mut result = content.to_string();
	for cap in re.captures_iter(content) {
		let full_match = &cap[0];
		let var_name = &cap[1];

		let env_value =
			env::var(var_name).map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

		result = result.replace(full_match, &env_value);
	}

	Ok(result)
}

/// Checks the cross-field rules serde cannot express.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
	let gateway = &config.gateway;

	if gateway.fee_bps > MAX_FEE_BPS {
		return Err(ConfigError::ValidationError(format!(
			"fee_bps {} exceeds the ceiling of {}",
			gateway.fee_bps, MAX_FEE_BPS
		)));
	}

	if gateway.address == Address::ZERO {
		return Err(ConfigError::ValidationError(
			"gateway.address must not be the zero address".to_string(),
		));
	}

	if gateway.owner == Address::ZERO {
		return Err(ConfigError::ValidationError(
			"gateway.owner must not be the zero address".to_string(),
		));
	}

	if gateway.selection_amount.is_zero() {
		return Err(ConfigError::ValidationError(
			"selection_amount must be greater than zero".to_string(),
		));
	}

	if gateway.quote_timeout_ms == 0 {
		return Err(ConfigError::ValidationError(
			"quote_timeout_ms must be greater than zero".to_string(),
		));
	}

	if gateway.event_capacity == 0 {
		return Err(ConfigError::ValidationError(
			"event_capacity must be greater than zero".to_string(),
		));
	}

	if config.endpoints.is_empty() {
		return Err(ConfigError::ValidationError(
			"At least one endpoint must be configured".to_string(),
		));
	}

	let mut names = HashSet::new();
	for endpoint in &config.endpoints {
		if !names.insert(endpoint.name.as_str()) {
			return Err(ConfigError::ValidationError(format!(
				"Duplicate endpoint name '{}'",
				endpoint.name
			)));
		}
		if !endpoint.config.is_table() {
			return Err(ConfigError::ValidationError(format!(
				"Endpoint '{}' config must be a table",
				endpoint.name
			)));
		}
	}

	let mut tokens = HashSet::new();
	for key in &config.api.keys {
		if key.token.trim().is_empty() {
			return Err(ConfigError::ValidationError(format!(
				"API key for {} has an empty token",
				key.account
			)));
		}
		if !tokens.insert(key.token.as_str()) {
			return Err(ConfigError::ValidationError(format!(
				"Duplicate API token for {}",
				key.account
			)));
		}
	}

	Ok(())
}
