// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Init-container gate: block until the secret file is materialized.

use std::path::Path;

use tracing::info;

use crate::config::SidecarConfig;

/// Whether the secret file exists and carries content.
///
/// A zero-length file counts as not materialized: the sidecar writes the
/// payload in one call, so an empty file means no sync has completed yet.
pub fn secret_materialized(path: &Path) -> bool {
	std::fs::metadata(path)
		.map(|meta| meta.is_file() && meta.len() > 0)
		.unwrap_or(false)
}

/// Polls until the secret file is materialized, then exits the process
/// with status zero after the configured grace period.
pub async fn wait_for_secret(config: &SidecarConfig) {
	info!(
		path = %config.secrets_path.display(),
		interval_ms = config.init_poll_interval.as_millis() as u64,
		"waiting for secret to materialize"
	);

	loop {
		if secret_materialized(&config.secrets_path) {
			info!(path = %config.secrets_path.display(), "secret materialized, releasing pod");
			tokio::time::sleep(config.init_exit_grace).await;
			std::process::exit(0);
		}

		info!("secret not materialized yet");
		tokio::time::sleep(config.init_poll_interval).await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_missing_file_is_not_materialized() {
		let dir = tempfile::tempdir().unwrap();
		assert!(!secret_materialized(&dir.path().join("secrets.json")));
	}

	#[test]
	fn test_empty_file_is_not_materialized() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("secrets.json");
		std::fs::File::create(&path).unwrap();

		assert!(!secret_materialized(&path));
	}

	#[test]
	fn test_directory_is_not_materialized() {
		let dir = tempfile::tempdir().unwrap();
		assert!(!secret_materialized(dir.path()));
	}

	#[test]
	fn test_non_empty_file_is_materialized() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("secrets.json");
		let mut file = std::fs::File::create(&path).unwrap();
		file.write_all(b"{\"user\":\"admin\"}").unwrap();

		assert!(secret_materialized(&path));
	}
}
