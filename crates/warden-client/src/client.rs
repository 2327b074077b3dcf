// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Fetch and store operations against the safe service.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use url::Url;
use warden_common_identity::IdentityMatcher;

use crate::channel::SecureChannel;
use crate::error::{Result, SecretsClientError};
use crate::reqres::{SecretFetchResponse, SecretStoreRequest, SecretStoreResponse};
use crate::source::{IdentitySource, WorkloadApiSource};

/// Keys stored through [`SecretsClient::store`] are namespaced with this
/// prefix so raw workload writes can never collide with operator-managed
/// secrets.
pub const RAW_KEY_PREFIX: &str = "raw:";

/// Path of the workload secrets resource, relative to the endpoint root.
const SECRETS_PATH: &str = "workload/v1/secrets";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder for [`SecretsClient`].
pub struct SecretsClientBuilder {
	safe_endpoint: Option<Url>,
	matcher: Option<IdentityMatcher>,
	identity_source: Option<Arc<dyn IdentitySource>>,
	spiffe_socket: Option<String>,
	request_timeout: Duration,
}

impl SecretsClientBuilder {
	/// Root URL of the safe service, e.g.
	/// `https://warden-safe.warden-system.svc:8443/`.
	pub fn safe_endpoint(mut self, endpoint: Url) -> Self {
		self.safe_endpoint = Some(endpoint);
		self
	}

	/// Identity matcher used to gate the local workload and authorize the
	/// TLS peer.
	pub fn matcher(mut self, matcher: IdentityMatcher) -> Self {
		self.matcher = Some(matcher);
		self
	}

	/// Workload API socket address. Ignored when an explicit identity
	/// source is set.
	pub fn spiffe_socket(mut self, socket: impl Into<String>) -> Self {
		self.spiffe_socket = Some(socket.into());
		self
	}

	/// Substitutes the identity source. Intended for tests and
	/// non-SPIFFE identity plumbing.
	pub fn identity_source(mut self, source: impl IdentitySource + 'static) -> Self {
		self.identity_source = Some(Arc::new(source));
		self
	}

	/// Per-exchange timeout, connection establishment included.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;
		self
	}

	pub fn build(self) -> Result<SecretsClient> {
		let endpoint = self.safe_endpoint.ok_or(SecretsClientError::MissingEndpoint)?;
		let matcher = self.matcher.ok_or(SecretsClientError::MissingMatcher)?;

		let source = match self.identity_source {
			Some(source) => source,
			None => match self.spiffe_socket {
				Some(socket) => Arc::new(WorkloadApiSource::new(socket)),
				None => Arc::new(WorkloadApiSource::default()),
			},
		};

		Ok(SecretsClient {
			secrets_url: secrets_url(&endpoint)?,
			matcher: Arc::new(matcher),
			source,
			request_timeout: self.request_timeout,
		})
	}
}

/// Client workloads use to exchange secrets with the safe service.
///
/// Every operation opens its own [`SecureChannel`], so identity material
/// is re-read on each call and no connection outlives an exchange.
pub struct SecretsClient {
	secrets_url: Url,
	matcher: Arc<IdentityMatcher>,
	source: Arc<dyn IdentitySource>,
	request_timeout: Duration,
}

impl SecretsClient {
	pub fn builder() -> SecretsClientBuilder {
		SecretsClientBuilder {
			safe_endpoint: None,
			matcher: None,
			identity_source: None,
			spiffe_socket: None,
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
		}
	}

	/// Fetches the secret registered for this workload.
	///
	/// Returns [`SecretsClientError::SecretNotFound`] when no secret has
	/// been provisioned for the workload yet; callers polling at startup
	/// treat that as "keep waiting", not as a failure.
	pub async fn fetch(&self) -> Result<SecretFetchResponse> {
		let channel =
			SecureChannel::open(self.source.as_ref(), &self.matcher, self.request_timeout).await?;

		debug!(url = %self.secrets_url, "fetching workload secret");

		let response = channel
			.http()
			.get(self.secrets_url.clone())
			.send()
			.await
			.map_err(SecretsClientError::Transport)?;

		let status = response.status();
		if status == reqwest::StatusCode::NOT_FOUND {
			return Err(SecretsClientError::SecretNotFound);
		}
		if !status.is_success() {
			return Err(SecretsClientError::UnexpectedStatus(status));
		}

		let body = response
			.text()
			.await
			.map_err(SecretsClientError::ResponseRead)?;
		let fetched: SecretFetchResponse = serde_json::from_str(&body)?;

		info!(updated = %fetched.updated, "fetched workload secret");
		Ok(fetched)
	}

	/// Stores `value` under `key`, prefixed with [`RAW_KEY_PREFIX`].
	///
	/// Only identities classified as clerks may store; the check runs
	/// before any request is sent.
	pub async fn store(&self, key: &str, value: &str) -> Result<SecretStoreResponse> {
		let channel =
			SecureChannel::open(self.source.as_ref(), &self.matcher, self.request_timeout).await?;

		if !self.matcher.is_clerk(channel.spiffe_id()) {
			return Err(SecretsClientError::UntrustedWorkload(
				channel.spiffe_id().to_string(),
			));
		}

		let request = SecretStoreRequest {
			key: format!("{RAW_KEY_PREFIX}{key}"),
			value: value.to_string(),
			err: None,
		};

		debug!(url = %self.secrets_url, key = %request.key, "storing secret");

		let response = channel
			.http()
			.post(self.secrets_url.clone())
			.json(&request)
			.send()
			.await
			.map_err(SecretsClientError::Transport)?;

		let status = response.status();
		if !status.is_success() {
			return Err(SecretsClientError::UnexpectedStatus(status));
		}

		let body = response
			.text()
			.await
			.map_err(SecretsClientError::ResponseRead)?;
		let stored: SecretStoreResponse = serde_json::from_str(&body)?;

		info!(key = %request.key, "stored secret");
		Ok(stored)
	}
}

/// Resolves the workload secrets URL under `endpoint`, treating the
/// endpoint as a directory whether or not it carries a trailing slash.
/// Any query or fragment on the endpoint is discarded.
fn secrets_url(endpoint: &Url) -> Result<Url> {
	let mut base = endpoint.clone();
	if !base.path().ends_with('/') {
		base.set_path(&format!("{}/", base.path()));
	}
	Ok(base.join(SECRETS_PATH)?)
}
