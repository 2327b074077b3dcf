// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Environment-driven configuration for the sidecar binaries.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;
use url::Url;
use warden_client::DEFAULT_WORKLOAD_API_SOCKET;
use warden_common_identity::IdentityPatterns;
use warden_common_retry::RetryStrategy;

use crate::error::SidecarError;

/// Environment variable naming the safe service root URL.
pub const ENV_SAFE_ENDPOINT: &str = "WARDEN_SAFE_ENDPOINT_URL";
/// Environment variable naming the SPIFFE Workload API socket.
pub const ENV_SPIFFE_SOCKET: &str = "SPIFFE_ENDPOINT_SOCKET";
/// Environment variable naming the file the secret is written to.
pub const ENV_SECRETS_PATH: &str = "WARDEN_SIDECAR_SECRETS_PATH";
/// Environment variable for the sidecar poll interval in milliseconds.
pub const ENV_POLL_INTERVAL: &str = "WARDEN_SIDECAR_POLL_INTERVAL";
/// Environment variable for the init poll interval in milliseconds.
pub const ENV_INIT_POLL_INTERVAL: &str = "WARDEN_INIT_POLL_INTERVAL";
/// Environment variable for the init exit grace period in milliseconds.
pub const ENV_INIT_EXIT_GRACE: &str = "WARDEN_INIT_EXIT_GRACE";

const DEFAULT_SAFE_ENDPOINT: &str = "https://warden-safe.warden-system.svc.cluster.local:8443/";
const DEFAULT_SECRETS_PATH: &str = "/opt/warden/secrets.json";
const DEFAULT_POLL_INTERVAL_MS: u64 = 20_000;
const DEFAULT_INIT_POLL_INTERVAL_MS: u64 = 5_000;
const DEFAULT_INIT_EXIT_GRACE_MS: u64 = 5_000;

/// Configuration shared by the sidecar and init binaries.
#[derive(Debug, Clone)]
pub struct SidecarConfig {
	/// Root URL of the safe service. Must be `https` when read from the
	/// environment.
	pub safe_endpoint: Url,
	/// SPIFFE Workload API socket address.
	pub spiffe_socket: String,
	/// File the workload secret is materialized into.
	pub secrets_path: PathBuf,
	/// How often the sidecar re-fetches the secret.
	pub poll_interval: Duration,
	/// How often the init binary re-checks the secret file.
	pub init_poll_interval: Duration,
	/// Pause between the secret appearing and the init binary exiting, so
	/// sibling containers observe a stable file.
	pub init_exit_grace: Duration,
	/// Identity classification patterns.
	pub patterns: IdentityPatterns,
	/// Retry strategy applied inside a single sync cycle: constant-delay
	/// attempts spaced one poll interval apart.
	pub retry: RetryStrategy,
}

impl SidecarConfig {
	/// Builds a configuration with defaults for everything except the
	/// endpoint. No scheme restriction is applied here; the environment
	/// loader enforces `https`.
	pub fn new(safe_endpoint: Url) -> Self {
		let poll_interval = Duration::from_millis(DEFAULT_POLL_INTERVAL_MS);
		Self {
			safe_endpoint,
			spiffe_socket: DEFAULT_WORKLOAD_API_SOCKET.to_string(),
			secrets_path: PathBuf::from(DEFAULT_SECRETS_PATH),
			poll_interval,
			init_poll_interval: Duration::from_millis(DEFAULT_INIT_POLL_INTERVAL_MS),
			init_exit_grace: Duration::from_millis(DEFAULT_INIT_EXIT_GRACE_MS),
			patterns: IdentityPatterns::from_env(),
			retry: sync_retry(poll_interval),
		}
	}

	/// Loads configuration from the environment.
	pub fn from_env() -> Result<Self, SidecarError> {
		let raw_endpoint = env_or(ENV_SAFE_ENDPOINT, DEFAULT_SAFE_ENDPOINT);
		let safe_endpoint: Url = raw_endpoint.parse().map_err(|e| {
			SidecarError::Config(format!("{ENV_SAFE_ENDPOINT} {raw_endpoint:?} is not a URL: {e}"))
		})?;
		require_https(&safe_endpoint)?;

		let poll_interval = interval_from_env(ENV_POLL_INTERVAL, DEFAULT_POLL_INTERVAL_MS);

		Ok(Self {
			safe_endpoint,
			spiffe_socket: env_or(ENV_SPIFFE_SOCKET, DEFAULT_WORKLOAD_API_SOCKET),
			secrets_path: PathBuf::from(env_or(ENV_SECRETS_PATH, DEFAULT_SECRETS_PATH)),
			poll_interval,
			init_poll_interval: interval_from_env(
				ENV_INIT_POLL_INTERVAL,
				DEFAULT_INIT_POLL_INTERVAL_MS,
			),
			init_exit_grace: interval_from_env(ENV_INIT_EXIT_GRACE, DEFAULT_INIT_EXIT_GRACE_MS),
			patterns: IdentityPatterns::from_env(),
			retry: sync_retry(poll_interval),
		})
	}
}

fn sync_retry(poll_interval: Duration) -> RetryStrategy {
	RetryStrategy {
		max_retries: 10,
		delay: poll_interval,
		exponential: false,
		max_wait: None,
	}
}

fn require_https(url: &Url) -> Result<(), SidecarError> {
	if url.scheme() != "https" {
		return Err(SidecarError::Config(format!(
			"safe service endpoint {url} must use https"
		)));
	}
	Ok(())
}

fn env_or(name: &str, default: &str) -> String {
	std::env::var(name)
		.ok()
		.filter(|v| !v.is_empty())
		.unwrap_or_else(|| default.to_string())
}

/// Parses a millisecond interval from the environment. A malformed value
/// falls back to the default rather than aborting the sidecar.
fn interval_from_env(name: &str, default_ms: u64) -> Duration {
	let ms = match std::env::var(name) {
		Ok(value) if !value.is_empty() => match value.parse::<u64>() {
			Ok(ms) => ms,
			Err(_) => {
				warn!(var = name, value = %value, default_ms, "unparseable interval, using default");
				default_ms
			}
		},
		_ => default_ms,
	};
	Duration::from_millis(ms)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_new_applies_defaults() {
		let config = SidecarConfig::new("https://safe.local:8443/".parse().unwrap());

		assert_eq!(config.spiffe_socket, DEFAULT_WORKLOAD_API_SOCKET);
		assert_eq!(config.secrets_path, PathBuf::from("/opt/warden/secrets.json"));
		assert_eq!(config.poll_interval, Duration::from_secs(20));
		assert_eq!(config.init_poll_interval, Duration::from_secs(5));
		assert_eq!(config.init_exit_grace, Duration::from_secs(5));
	}

	#[test]
	fn test_require_https_rejects_plain_http() {
		let result = require_https(&"http://safe.local:8443/".parse().unwrap());
		assert!(matches!(result, Err(SidecarError::Config(_))));
	}

	#[test]
	fn test_require_https_accepts_https() {
		assert!(require_https(&"https://safe.local:8443/".parse().unwrap()).is_ok());
	}

	#[test]
	fn test_retry_delay_tracks_poll_interval() {
		let config = SidecarConfig::new("https://safe.local:8443/".parse().unwrap());

		assert_eq!(config.retry.max_retries, 10);
		assert_eq!(config.retry.delay, config.poll_interval);
		assert!(!config.retry.exponential);
		assert_eq!(config.retry.max_wait, None);
	}
}
