// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Client library for workloads to exchange secrets with the Warden safe
//! service.
//!
//! The safe service is reached over mutually authenticated TLS: the local
//! workload presents the SVID obtained from the SPIFFE Workload API, and
//! the peer is accepted only if its certificate chains to the trust bundle
//! and carries the safe service's SPIFFE ID. Identity material is read
//! fresh for every exchange so certificate rotation is picked up without
//! restarts, and every exchange runs over its own single-use connection.
//!
//! # Example
//! ```ignore
//! let matcher = IdentityMatcher::new(&IdentityPatterns::from_env())?;
//! let client = SecretsClient::builder()
//!     .safe_endpoint("https://warden-safe.warden-system.svc:8443/".parse()?)
//!     .matcher(matcher)
//!     .build()?;
//!
//! let secret = client.fetch().await?;
//! ```

mod channel;
mod client;
mod error;
mod source;
mod verify;

pub mod data;
pub mod reqres;

pub use channel::SecureChannel;
pub use client::{SecretsClient, SecretsClientBuilder, RAW_KEY_PREFIX};
pub use error::{Result, SecretsClientError};
pub use source::{IdentitySource, WorkloadApiSource, WorkloadIdentity, DEFAULT_WORKLOAD_API_SOCKET};

// Re-exported so consumers configure classification without naming the
// identity crate directly.
pub use warden_common_identity::{IdentityMatcher, IdentityPatterns, PrivilegedRole};
