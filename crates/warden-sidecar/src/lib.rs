// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Sidecar machinery keeping a workload's secret materialized on disk.
//!
//! Two binaries share this crate: `warden-sidecar` polls the safe service
//! and writes the secret to a file for the lifetime of the pod, and
//! `warden-init` blocks pod startup until that file exists and is
//! non-empty, then exits so the main container can start.

pub mod config;
pub mod error;
pub mod init;
pub mod sync;

pub use config::SidecarConfig;
pub use error::SidecarError;

/// Installs the tracing subscriber for the binaries. Verbosity is driven
/// by `WARDEN_LOG`, defaulting to `info`.
pub fn init_tracing() {
	use tracing_subscriber::EnvFilter;

	let filter =
		EnvFilter::try_from_env("WARDEN_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).init();
}
