// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Init-container entrypoint: exits once the secret file is materialized.

use warden_sidecar::{config::SidecarConfig, init, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	init_tracing();

	let config = SidecarConfig::from_env()?;
	init::wait_for_secret(&config).await;
	Ok(())
}
