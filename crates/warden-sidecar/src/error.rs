// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;
use warden_client::SecretsClientError;
use warden_common_identity::IdentityConfigError;

/// Errors raised by the sidecar and init binaries.
#[derive(Debug, Error)]
pub enum SidecarError {
	/// Environment configuration is missing or malformed.
	#[error("configuration error: {0}")]
	Config(String),

	/// Identity patterns failed to compile (fail-closed).
	#[error("identity configuration error: {0}")]
	Identity(#[from] IdentityConfigError),

	/// The secrets client could not complete an exchange.
	#[error("secrets client error: {0}")]
	Client(#[from] SecretsClientError),

	/// Writing the secret file failed.
	#[error("secret file I/O error: {0}")]
	Io(#[from] std::io::Error),
}
