// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;
use warden_common_identity::IdentityConfigError;

/// Errors raised by the secrets client.
///
/// Transport, protocol and decode failures are distinct variants so an
/// operator can tell "can't reach the safe service" apart from "the safe
/// service responded but the body was malformed". `SecretNotFound` is a
/// first-class outcome only for fetch; store treats every non-2xx status
/// the same way.
#[derive(Debug, Error)]
pub enum SecretsClientError {
	/// Identity matching configuration is invalid (fail-closed).
	#[error("identity configuration error: {0}")]
	IdentityConfig(#[from] IdentityConfigError),

	/// The SPIFFE Workload API could not supply identity material.
	#[error("workload identity source error: {0}")]
	IdentitySource(String),

	/// The local identity does not classify into the role the operation
	/// requires. Raised before any network attempt.
	#[error("untrusted workload: '{0}'")]
	UntrustedWorkload(String),

	/// Building the mutually authenticated channel failed.
	#[error("TLS configuration error: {0}")]
	Tls(String),

	/// The safe service endpoint URL could not be constructed.
	#[error("invalid safe service URL: {0}")]
	InvalidUrl(#[from] url::ParseError),

	/// Connecting to or talking with the safe service failed.
	#[error("problem connecting to the safe service: {0}")]
	Transport(#[source] reqwest::Error),

	/// The requested secret has not been provisioned yet.
	#[error("secret does not exist")]
	SecretNotFound,

	/// The safe service answered with an unexpected status code.
	#[error("unexpected status from the safe service: {0}")]
	UnexpectedStatus(reqwest::StatusCode),

	/// The response body could not be read.
	#[error("unable to read the safe service response body: {0}")]
	ResponseRead(#[source] reqwest::Error),

	/// The response body was not valid JSON for the expected shape.
	#[error("unable to deserialize the safe service response: {0}")]
	Decode(#[from] serde_json::Error),

	/// Builder was not given a safe service endpoint.
	#[error("missing safe service endpoint URL")]
	MissingEndpoint,

	/// Builder was not given an identity matcher.
	#[error("missing identity matcher")]
	MissingMatcher,
}

/// Result type alias for secrets client operations.
pub type Result<T> = std::result::Result<T, SecretsClientError>;
