// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! The sidecar sync loop: fetch the secret, write it to disk, repeat.

use std::path::Path;

use tracing::{debug, info, warn};
use warden_client::{IdentityMatcher, SecretsClient};
use warden_common_retry::retry;

use crate::config::SidecarConfig;
use crate::error::SidecarError;

/// Builds the secrets client the sync loop uses.
pub fn build_client(config: &SidecarConfig) -> Result<SecretsClient, SidecarError> {
	let matcher = IdentityMatcher::new(&config.patterns)?;
	let client = SecretsClient::builder()
		.safe_endpoint(config.safe_endpoint.clone())
		.matcher(matcher)
		.spiffe_socket(config.spiffe_socket.clone())
		.build()?;
	Ok(client)
}

/// Fetches the workload secret and writes its payload to `path`.
///
/// The payload is written verbatim. The file is replaced wholesale on each
/// sync, so consumers never observe a mix of old and new content appended
/// together.
pub async fn sync_once(client: &SecretsClient, path: &Path) -> Result<(), SidecarError> {
	let response = client.fetch().await?;
	tokio::fs::write(path, response.data.as_bytes()).await?;
	debug!(path = %path.display(), bytes = response.data.len(), "secret written");
	Ok(())
}

/// One sync cycle: [`sync_once`] wrapped in the configured retry strategy.
pub async fn sync_cycle(client: &SecretsClient, config: &SidecarConfig) -> Result<(), SidecarError> {
	retry("sidecar.sync", &config.retry, || {
		sync_once(client, &config.secrets_path)
	})
	.await
}

/// Runs the sync loop forever.
///
/// A failed cycle is logged and the loop keeps going; the sidecar's job is
/// to converge, not to crash the pod over a transient outage. A missing
/// secret is a normal state before the operator provisions one.
pub async fn watch(client: &SecretsClient, config: &SidecarConfig) {
	info!(
		endpoint = %config.safe_endpoint,
		path = %config.secrets_path.display(),
		interval_ms = config.poll_interval.as_millis() as u64,
		"sidecar sync loop starting"
	);

	loop {
		if let Err(err) = sync_cycle(client, config).await {
			warn!(error = %err, "sync cycle failed, waiting for next cycle");
		}
		tokio::time::sleep(config.poll_interval).await;
	}
}
