// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! The identity matcher: compiled classification rules.

use regex::Regex;
use thiserror::Error;

use crate::config::IdentityPatterns;

/// Roles beyond plain workload membership. Both are strictly layered on top
/// of the workload check: no identity is privileged without first being a
/// workload under the trust domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivilegedRole {
	/// Privileged workload allowed to store raw secrets.
	Clerk,
	/// The secret-storage service itself.
	Safe,
}

/// Configuration errors detected while compiling identity patterns.
///
/// These are fail-closed: no matcher exists until the configuration is
/// valid, so a bad pattern can never silently authorize anything. The host
/// application decides whether to abort startup.
#[derive(Debug, Error)]
pub enum IdentityConfigError {
	/// A role or name pattern in regex mode failed to compile.
	#[error("invalid {role} pattern {pattern:?}: {source}")]
	InvalidPattern {
		role: &'static str,
		pattern: String,
		#[source]
		source: regex::Error,
	},

	/// The workload name pattern is not anchored to the trust domain. An
	/// unanchored pattern would accept identities from foreign trust
	/// domains, so it is rejected outright.
	#[error(
		"workload name pattern {pattern:?} must start with \"^spiffe://{trust_domain}/\""
	)]
	UnanchoredNamePattern {
		pattern: String,
		trust_domain: String,
	},
}

/// A compiled role rule: literal prefix or anchored regular expression.
#[derive(Debug, Clone)]
enum RoleRule {
	Prefix(String),
	Pattern(Regex),
}

/// Classifies SPIFFE IDs into roles under one trust domain.
///
/// The matcher holds only compiled configuration; classification is
/// recomputed on every call and never cached across identity rotation.
#[derive(Debug, Clone)]
pub struct IdentityMatcher {
	/// `spiffe://<trust-domain>/`. Every accepted identity starts here.
	id_prefix: String,
	workload_name: Regex,
	workload: RoleRule,
	clerk: RoleRule,
	safe: RoleRule,
}

impl IdentityMatcher {
	/// Compiles the patterns, rejecting any misconfiguration.
	pub fn new(patterns: &IdentityPatterns) -> Result<Self, IdentityConfigError> {
		let regex_anchor = format!("^spiffe://{}/", patterns.trust_domain);
		let id_prefix = format!("spiffe://{}/", patterns.trust_domain);

		if !patterns.workload_name.starts_with(&regex_anchor) {
			return Err(IdentityConfigError::UnanchoredNamePattern {
				pattern: patterns.workload_name.clone(),
				trust_domain: patterns.trust_domain.clone(),
			});
		}

		let workload_name = compile("workload name", &patterns.workload_name)?;
		let workload = compile_rule("workload", &patterns.workload, &regex_anchor)?;
		let clerk = compile_rule("clerk", &patterns.clerk, &regex_anchor)?;
		let safe = compile_rule("safe", &patterns.safe, &regex_anchor)?;

		Ok(Self {
			id_prefix,
			workload_name,
			workload,
			clerk,
			safe,
		})
	}

	/// Whether `id` classifies as a workload of this trust domain.
	///
	/// The identity must match the name-extraction pattern and the workload
	/// role rule. Anything outside the trust domain fails both.
	pub fn is_workload(&self, id: &str) -> bool {
		if id.is_empty() {
			return false;
		}
		if !self.workload_name.is_match(id) {
			return false;
		}
		self.matches_rule(id, &self.workload)
	}

	/// Whether `id` holds the given privileged role. Requires the workload
	/// classification first (layering invariant).
	pub fn is_privileged(&self, id: &str, role: PrivilegedRole) -> bool {
		if !self.is_workload(id) {
			return false;
		}
		let rule = match role {
			PrivilegedRole::Clerk => &self.clerk,
			PrivilegedRole::Safe => &self.safe,
		};
		self.matches_rule(id, rule)
	}

	/// Whether `id` is a clerk: a workload allowed to store raw secrets.
	pub fn is_clerk(&self, id: &str) -> bool {
		self.is_privileged(id, PrivilegedRole::Clerk)
	}

	/// Whether `id` is the safe service, the only peer workloads talk to.
	pub fn is_safe(&self, id: &str) -> bool {
		self.is_privileged(id, PrivilegedRole::Safe)
	}

	/// Extracts the logical workload name (the first capture of the name
	/// pattern), if the identity matches it.
	pub fn workload_name<'i>(&self, id: &'i str) -> Option<&'i str> {
		self
			.workload_name
			.captures(id)
			.and_then(|caps| caps.get(1))
			.map(|m| m.as_str())
	}

	fn matches_rule(&self, id: &str, rule: &RoleRule) -> bool {
		match rule {
			RoleRule::Pattern(re) => re.is_match(id),
			// Literal prefixes are only honored under the trust domain.
			RoleRule::Prefix(prefix) => id.starts_with(&self.id_prefix) && id.starts_with(prefix),
		}
	}
}

fn compile(role: &'static str, pattern: &str) -> Result<Regex, IdentityConfigError> {
	Regex::new(pattern).map_err(|source| IdentityConfigError::InvalidPattern {
		role,
		pattern: pattern.to_string(),
		source,
	})
}

/// A role pattern starting with the `^spiffe://<trust-domain>/` anchor is a
/// regular expression; anything else is a literal prefix.
fn compile_rule(
	role: &'static str,
	pattern: &str,
	regex_anchor: &str,
) -> Result<RoleRule, IdentityConfigError> {
	if pattern.starts_with(regex_anchor) {
		Ok(RoleRule::Pattern(compile(role, pattern)?))
	} else {
		Ok(RoleRule::Prefix(pattern.to_string()))
	}
}
