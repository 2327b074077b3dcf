// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Secret entities as the safe service presents them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage format of a secret value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretFormat {
	/// Structured JSON value.
	Json,
	/// Semi-structured YAML value.
	Yaml,
	/// Opaque bytes, stored as-is.
	Raw,
}

/// Algorithm used for at-rest encryption of secret values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncryptionAlgorithm {
	#[serde(rename = "age")]
	Age,
	#[serde(rename = "aes")]
	Aes,
}

/// Secret metadata that is safe to view: the value itself is omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Secret {
	pub name: String,
	pub created: DateTime<Utc>,
	pub updated: DateTime<Utc>,
	#[serde(rename = "notBefore")]
	pub not_before: DateTime<Utc>,
	#[serde(rename = "expiresAfter")]
	pub expires_after: DateTime<Utc>,
}

/// Secret with an encrypted value. Still safe to view, since only the
/// ciphertext is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretEncrypted {
	pub name: String,
	#[serde(rename = "value")]
	pub encrypted_value: String,
	pub created: DateTime<Utc>,
	pub updated: DateTime<Utc>,
	#[serde(rename = "notBefore")]
	pub not_before: DateTime<Utc>,
	#[serde(rename = "expiresAfter")]
	pub expires_after: DateTime<Utc>,
}
