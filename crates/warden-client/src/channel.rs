// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Mutually authenticated, single-use HTTP channel to the safe service.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONNECTION};
use tracing::debug;
use warden_common_identity::IdentityMatcher;

use crate::error::{Result, SecretsClientError};
use crate::source::IdentitySource;
use crate::verify::SpiffeServerVerifier;

/// An HTTP client bound to a fresh identity snapshot.
///
/// Opening a channel fetches the workload's current SVID, refuses to
/// proceed unless the local identity classifies as a workload, and wires
/// the SVID into a TLS configuration that both presents the workload
/// certificate and pins the peer to the safe service identity. Connections
/// are never pooled: each request closes its connection so the next
/// exchange renegotiates with whatever certificates are current.
pub struct SecureChannel {
	http: reqwest::Client,
	spiffe_id: String,
}

impl SecureChannel {
	/// Opens a channel using identity material from `source`.
	pub async fn open(
		source: &dyn IdentitySource,
		matcher: &Arc<IdentityMatcher>,
		timeout: Duration,
	) -> Result<Self> {
		let identity = source.fetch_identity().await?;

		if !matcher.is_workload(&identity.spiffe_id) {
			return Err(SecretsClientError::UntrustedWorkload(identity.spiffe_id));
		}

		debug!(spiffe_id = %identity.spiffe_id, "opening secure channel");

		let verifier = SpiffeServerVerifier::new(identity.trust_bundle, Arc::clone(matcher))?;
		let tls = rustls::ClientConfig::builder()
			.dangerous()
			.with_custom_certificate_verifier(Arc::new(verifier))
			.with_client_auth_cert(identity.cert_chain, identity.private_key)
			.map_err(|e| SecretsClientError::Tls(format!("unusable workload SVID: {e}")))?;

		let mut headers = HeaderMap::new();
		headers.insert(CONNECTION, HeaderValue::from_static("close"));

		let http = reqwest::Client::builder()
			.use_preconfigured_tls(tls)
			.default_headers(headers)
			.pool_max_idle_per_host(0)
			.timeout(timeout)
			.build()
			.map_err(SecretsClientError::Transport)?;

		Ok(Self {
			http,
			spiffe_id: identity.spiffe_id,
		})
	}

	/// SPIFFE ID the channel was opened with.
	pub fn spiffe_id(&self) -> &str {
		&self.spiffe_id
	}

	pub(crate) fn http(&self) -> &reqwest::Client {
		&self.http
	}
}
