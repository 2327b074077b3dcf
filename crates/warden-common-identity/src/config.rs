// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Identity matching configuration.

/// Trust domain used when `SPIFFE_TRUST_DOMAIN` is not set.
pub const DEFAULT_TRUST_DOMAIN: &str = "warden.local";

/// Environment variable for the trust domain.
pub const ENV_TRUST_DOMAIN: &str = "SPIFFE_TRUST_DOMAIN";
/// Environment variable for the workload role pattern.
pub const ENV_PREFIX_WORKLOAD: &str = "WARDEN_SPIFFEID_PREFIX_WORKLOAD";
/// Environment variable for the clerk role pattern.
pub const ENV_PREFIX_CLERK: &str = "WARDEN_SPIFFEID_PREFIX_CLERK";
/// Environment variable for the safe-service role pattern.
pub const ENV_PREFIX_SAFE: &str = "WARDEN_SPIFFEID_PREFIX_SAFE";
/// Environment variable for the workload name extraction pattern.
pub const ENV_WORKLOAD_NAME_REGEXP: &str = "WARDEN_WORKLOAD_NAME_REGEXP";

/// Raw identity-matching configuration: a trust domain plus one pattern per
/// role and a name-extraction pattern.
///
/// Each role pattern is either a literal prefix the identity must start
/// with, or, when its literal form begins with the
/// `^spiffe://<trust-domain>/` anchor, a regular expression. Validation
/// happens in [`IdentityMatcher::new`](crate::IdentityMatcher::new), not
/// here.
#[derive(Debug, Clone)]
pub struct IdentityPatterns {
	/// The administrative namespace all accepted identities live under.
	pub trust_domain: String,
	/// Pattern an identity must satisfy to count as a workload.
	pub workload: String,
	/// Pattern for the clerk role (privileged raw-secret writers).
	pub clerk: String,
	/// Pattern for the safe service (the storage peer).
	pub safe: String,
	/// Pattern extracting the logical workload name as its first capture.
	/// Must be anchored at `^spiffe://<trust-domain>/`.
	pub workload_name: String,
}

impl IdentityPatterns {
	/// Default patterns for a trust domain, mirroring the standard
	/// `workload/<name>/ns/<ns>/sa/<sa>/n/<instance>` path layout.
	pub fn for_trust_domain(trust_domain: &str) -> Self {
		Self {
			trust_domain: trust_domain.to_string(),
			workload: format!(
				"^spiffe://{trust_domain}/workload/[^/]+/ns/[^/]+/sa/[^/]+/n/[^/]+$"
			),
			clerk: format!(
				"^spiffe://{trust_domain}/workload/warden-clerk/ns/warden-clerk/sa/warden-clerk/n/[^/]+$"
			),
			safe: format!(
				"^spiffe://{trust_domain}/workload/warden-safe/ns/warden-system/sa/warden-safe/n/[^/]+$"
			),
			workload_name: format!(
				"^spiffe://{trust_domain}/workload/([^/]+)/ns/[^/]+/sa/[^/]+/n/[^/]+$"
			),
		}
	}

	/// Loads patterns from the environment, falling back to the defaults
	/// derived from the configured (or default) trust domain.
	pub fn from_env() -> Self {
		let trust_domain = env_or(ENV_TRUST_DOMAIN, DEFAULT_TRUST_DOMAIN);
		let mut patterns = Self::for_trust_domain(&trust_domain);

		if let Some(value) = env_nonempty(ENV_PREFIX_WORKLOAD) {
			patterns.workload = value;
		}
		if let Some(value) = env_nonempty(ENV_PREFIX_CLERK) {
			patterns.clerk = value;
		}
		if let Some(value) = env_nonempty(ENV_PREFIX_SAFE) {
			patterns.safe = value;
		}
		if let Some(value) = env_nonempty(ENV_WORKLOAD_NAME_REGEXP) {
			patterns.workload_name = value;
		}

		patterns
	}
}

fn env_or(name: &str, default: &str) -> String {
	env_nonempty(name).unwrap_or_else(|| default.to_string())
}

fn env_nonempty(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|v| !v.is_empty())
}
