// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! SPIFFE-aware server certificate verification.
//!
//! TLS peers are not identified by hostname: the peer's identity is the
//! SPIFFE ID carried in the URI SAN of its leaf certificate. The verifier
//! first validates the presented chain against the workload's trust bundle
//! and then authorizes the extracted SPIFFE ID: the safe service is the
//! only peer any Warden workload talks to.

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::verify_server_cert_signed_by_trust_anchor;
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, WebPkiSupportedAlgorithms};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::server::ParsedCertificate;
use rustls::{DigitallySignedStruct, Error as TlsError, RootCertStore, SignatureScheme};
use warden_common_identity::IdentityMatcher;
use x509_parser::prelude::{FromDer, GeneralName, X509Certificate};

use crate::error::SecretsClientError;

/// Verifies the safe service's certificate chain against the trust bundle
/// and its SPIFFE ID against the identity matcher.
#[derive(Debug)]
pub(crate) struct SpiffeServerVerifier {
	roots: RootCertStore,
	matcher: Arc<IdentityMatcher>,
	algorithms: WebPkiSupportedAlgorithms,
}

impl SpiffeServerVerifier {
	pub(crate) fn new(
		trust_bundle: Vec<CertificateDer<'static>>,
		matcher: Arc<IdentityMatcher>,
	) -> Result<Self, SecretsClientError> {
		let mut roots = RootCertStore::empty();
		for authority in trust_bundle {
			roots
				.add(authority)
				.map_err(|e| SecretsClientError::Tls(format!("unusable trust bundle: {e}")))?;
		}
		if roots.is_empty() {
			return Err(SecretsClientError::Tls(
				"trust bundle contains no authorities".to_string(),
			));
		}

		Ok(Self {
			roots,
			matcher,
			algorithms: rustls::crypto::ring::default_provider().signature_verification_algorithms,
		})
	}
}

impl ServerCertVerifier for SpiffeServerVerifier {
	fn verify_server_cert(
		&self,
		end_entity: &CertificateDer<'_>,
		intermediates: &[CertificateDer<'_>],
		_server_name: &ServerName<'_>,
		_ocsp_response: &[u8],
		now: UnixTime,
	) -> Result<ServerCertVerified, TlsError> {
		let parsed = ParsedCertificate::try_from(end_entity)?;
		verify_server_cert_signed_by_trust_anchor(
			&parsed,
			&self.roots,
			intermediates,
			now,
			self.algorithms.all,
		)?;

		let peer_id = peer_spiffe_id(end_entity)?;
		if self.matcher.is_safe(&peer_id) {
			Ok(ServerCertVerified::assertion())
		} else {
			Err(TlsError::General(format!(
				"peer '{peer_id}' is not the safe service"
			)))
		}
	}

	fn verify_tls12_signature(
		&self,
		message: &[u8],
		cert: &CertificateDer<'_>,
		dss: &DigitallySignedStruct,
	) -> Result<HandshakeSignatureValid, TlsError> {
		verify_tls12_signature(message, cert, dss, &self.algorithms)
	}

	fn verify_tls13_signature(
		&self,
		message: &[u8],
		cert: &CertificateDer<'_>,
		dss: &DigitallySignedStruct,
	) -> Result<HandshakeSignatureValid, TlsError> {
		verify_tls13_signature(message, cert, dss, &self.algorithms)
	}

	fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
		self.algorithms.supported_schemes()
	}
}

/// Extracts the SPIFFE ID from the URI SAN of a certificate.
fn peer_spiffe_id(der: &CertificateDer<'_>) -> Result<String, TlsError> {
	let (_, cert) = X509Certificate::from_der(der.as_ref())
		.map_err(|e| TlsError::General(format!("unparseable peer certificate: {e}")))?;

	let san = cert
		.subject_alternative_name()
		.map_err(|e| TlsError::General(format!("malformed subject alternative name: {e}")))?;

	san
		.and_then(|ext| {
			ext.value.general_names.iter().find_map(|name| match name {
				GeneralName::URI(uri) if uri.starts_with("spiffe://") => Some(uri.to_string()),
				_ => None,
			})
		})
		.ok_or_else(|| TlsError::General("peer certificate has no SPIFFE URI SAN".to_string()))
}
