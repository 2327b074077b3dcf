// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Identity material and the source it is fetched from.

use async_trait::async_trait;
use rustls_pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use spiffe::WorkloadApiClient;

use crate::error::{Result, SecretsClientError};

/// Workload API socket used when none is configured.
pub const DEFAULT_WORKLOAD_API_SOCKET: &str = "unix:///spire-agent-socket/spire-agent.sock";

/// A point-in-time snapshot of the local workload's identity: leaf
/// certificate chain, private key, and the trust bundle of its trust
/// domain.
///
/// Snapshots are short-lived by design. Each secure channel build fetches a
/// fresh one so rotated certificates are picked up immediately; nothing in
/// this crate caches identity material.
#[derive(Debug)]
pub struct WorkloadIdentity {
	/// The workload's SPIFFE ID.
	pub spiffe_id: String,
	/// Leaf certificate first, then any intermediates.
	pub cert_chain: Vec<CertificateDer<'static>>,
	/// Private key for the leaf certificate (PKCS#8).
	pub private_key: PrivateKeyDer<'static>,
	/// CA certificates of the trust domain.
	pub trust_bundle: Vec<CertificateDer<'static>>,
}

impl Clone for WorkloadIdentity {
	fn clone(&self) -> Self {
		Self {
			spiffe_id: self.spiffe_id.clone(),
			cert_chain: self.cert_chain.clone(),
			private_key: self.private_key.clone_key(),
			trust_bundle: self.trust_bundle.clone(),
		}
	}
}

/// Source of workload identity material.
///
/// The production implementation is [`WorkloadApiSource`]; tests substitute
/// a static source.
#[async_trait]
pub trait IdentitySource: Send + Sync {
	/// Fetches the current identity snapshot. A local call, though it may
	/// suspend while the identity infrastructure responds.
	async fn fetch_identity(&self) -> Result<WorkloadIdentity>;
}

/// Identity source backed by the SPIFFE Workload API at a local socket.
#[derive(Debug, Clone)]
pub struct WorkloadApiSource {
	socket_path: String,
}

impl WorkloadApiSource {
	/// Creates a source reading from the given Workload API socket
	/// address, e.g. `unix:///spire-agent-socket/spire-agent.sock`.
	pub fn new(socket_path: impl Into<String>) -> Self {
		Self {
			socket_path: socket_path.into(),
		}
	}
}

impl Default for WorkloadApiSource {
	fn default() -> Self {
		Self::new(DEFAULT_WORKLOAD_API_SOCKET)
	}
}

#[async_trait]
impl IdentitySource for WorkloadApiSource {
	async fn fetch_identity(&self) -> Result<WorkloadIdentity> {
		let mut client = WorkloadApiClient::new_from_path(&self.socket_path)
			.await
			.map_err(|e| {
				SecretsClientError::IdentitySource(format!(
					"failed connecting to the workload API at {}: {e}",
					self.socket_path
				))
			})?;

		let svid = client.fetch_x509_svid().await.map_err(|e| {
			SecretsClientError::IdentitySource(format!("failed getting SVID: {e}"))
		})?;

		let bundles = client.fetch_x509_bundles().await.map_err(|e| {
			SecretsClientError::IdentitySource(format!("failed getting trust bundles: {e}"))
		})?;

		let trust_domain = svid.spiffe_id().trust_domain();
		let bundle = bundles.get_bundle(trust_domain).ok_or_else(|| {
			SecretsClientError::IdentitySource(format!(
				"no trust bundle for trust domain {trust_domain}"
			))
		})?;

		Ok(WorkloadIdentity {
			spiffe_id: svid.spiffe_id().to_string(),
			cert_chain: svid
				.cert_chain()
				.iter()
				.map(|cert| CertificateDer::from(cert.content().to_vec()))
				.collect(),
			private_key: PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(
				svid.private_key().content().to_vec(),
			)),
			trust_bundle: bundle
				.authorities()
				.iter()
				.map(|cert| CertificateDer::from(cert.content().to_vec()))
				.collect(),
		})
	}
}
