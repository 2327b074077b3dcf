// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Sidecar entrypoint: keeps the workload secret synced to disk.

use warden_sidecar::{config::SidecarConfig, init_tracing, sync};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	init_tracing();

	let config = SidecarConfig::from_env()?;
	let client = sync::build_client(&config)?;

	sync::watch(&client, &config).await;
	Ok(())
}
