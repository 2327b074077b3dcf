// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Request and response shapes of the safe service API.
//!
//! Only fetch and store are exercised by [`SecretsClient`](crate::
//! SecretsClient); the remaining shapes are the rest of the service's wire
//! contract, declared here for tools that compose them directly.

use serde::{Deserialize, Serialize};

use crate::data::{EncryptionAlgorithm, Secret, SecretEncrypted, SecretFormat};

/// Request to fetch the secret registered for the calling workload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretFetchRequest {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub err: Option<String>,
}

/// Response to a fetch: the secret payload and its timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretFetchResponse {
	pub data: String,
	pub created: String,
	pub updated: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub err: Option<String>,
}

/// Request to store a raw secret under a key.
///
/// The value travels under the `data` wire field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretStoreRequest {
	pub key: String,
	#[serde(rename = "data")]
	pub value: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub err: Option<String>,
}

/// Response to a store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretStoreResponse {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub err: Option<String>,
}

/// Request to upsert a fully described secret record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretUpsertRequest {
	#[serde(rename = "workloads")]
	pub workload_ids: Vec<String>,
	pub namespaces: Vec<String>,
	pub value: String,
	pub template: String,
	pub format: SecretFormat,
	pub encrypt: bool,
	#[serde(rename = "notBefore")]
	pub not_before: String,
	pub expires: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub err: Option<String>,
}

/// Response to an upsert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretUpsertResponse {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub err: Option<String>,
}

/// Request to list secrets. The response never contains secret values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretListRequest {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub err: Option<String>,
}

/// Response listing secret metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretListResponse {
	pub secrets: Vec<Secret>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub err: Option<String>,
}

/// Response listing secrets with encrypted values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretEncryptedListResponse {
	pub secrets: Vec<SecretEncrypted>,
	pub algorithm: EncryptionAlgorithm,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub err: Option<String>,
}

/// Request to delete the secrets of the named workloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretDeleteRequest {
	#[serde(rename = "workloads")]
	pub workload_ids: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub err: Option<String>,
}

/// Response to a delete.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretDeleteResponse {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub err: Option<String>,
}
