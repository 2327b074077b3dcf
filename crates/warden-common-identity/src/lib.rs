// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! SPIFFE ID role classification for the Warden trust model.
//!
//! Every identity Warden accepts is anchored to a single configured trust
//! domain. Within that domain, identities classify into roles:
//!
//! - **workload**: any identity the deployment recognizes as one of its own
//! - **clerk**: a privileged workload allowed to write raw secrets
//! - **safe**: the secret-storage service itself, the sole accepted peer
//!
//! Classification is a pure function of the identity string and the
//! compiled [`IdentityPatterns`]; nothing is cached per identity, so
//! rotated identities are re-evaluated on every check. Misconfigured
//! patterns are rejected at [`IdentityMatcher::new`]; authorization never
//! proceeds on a best-effort basis.

mod config;
mod matcher;

pub use config::{IdentityPatterns, DEFAULT_TRUST_DOMAIN};
pub use matcher::{IdentityConfigError, IdentityMatcher, PrivilegedRole};
