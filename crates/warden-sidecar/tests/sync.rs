// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Sync loop behavior against a mock safe service.

use std::time::Duration;

use async_trait::async_trait;
use rcgen::{CertificateParams, KeyPair, SanType};
use rustls_pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use warden_client::{
	IdentityMatcher, IdentityPatterns, IdentitySource, Result as ClientResult, SecretsClient,
	SecretsClientError, WorkloadIdentity,
};
use warden_common_retry::RetryStrategy;
use warden_sidecar::config::SidecarConfig;
use warden_sidecar::error::SidecarError;
use warden_sidecar::sync::{sync_cycle, sync_once, watch};

const WORKLOAD_ID: &str = "spiffe://warden.local/workload/billing/ns/default/sa/default/n/pod-1";

struct StaticSource {
	identity: WorkloadIdentity,
}

#[async_trait]
impl IdentitySource for StaticSource {
	async fn fetch_identity(&self) -> ClientResult<WorkloadIdentity> {
		Ok(self.identity.clone())
	}
}

fn static_identity(spiffe_id: &str) -> WorkloadIdentity {
	let mut params = CertificateParams::default();
	params
		.subject_alt_names
		.push(SanType::URI(spiffe_id.try_into().unwrap()));
	let key = KeyPair::generate().unwrap();
	let cert = params.self_signed(&key).unwrap();

	WorkloadIdentity {
		spiffe_id: spiffe_id.to_string(),
		cert_chain: vec![cert.der().clone()],
		private_key: PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key.serialize_der())),
		trust_bundle: vec![cert.der().clone()],
	}
}

fn client_for(server: &MockServer) -> SecretsClient {
	let matcher = IdentityMatcher::new(&IdentityPatterns::for_trust_domain("warden.local")).unwrap();

	SecretsClient::builder()
		.safe_endpoint(server.uri().parse().unwrap())
		.matcher(matcher)
		.identity_source(StaticSource {
			identity: static_identity(WORKLOAD_ID),
		})
		.build()
		.unwrap()
}

fn fetch_body(data: &str) -> String {
	format!(
		r#"{{"data":"{data}","created":"2025-01-01T00:00:00Z","updated":"2025-01-02T00:00:00Z"}}"#
	)
}

#[tokio::test]
async fn test_sync_once_writes_secret_to_disk() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/workload/v1/secrets"))
		.respond_with(ResponseTemplate::new(200).set_body_string(fetch_body("top-secret")))
		.mount(&server)
		.await;

	let dir = tempfile::tempdir().unwrap();
	let secrets_path = dir.path().join("secrets.json");

	let client = client_for(&server);
	sync_once(&client, &secrets_path).await.unwrap();

	assert_eq!(std::fs::read_to_string(&secrets_path).unwrap(), "top-secret");
}

#[tokio::test]
async fn test_sync_once_replaces_previous_content() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/workload/v1/secrets"))
		.respond_with(ResponseTemplate::new(200).set_body_string(fetch_body("v2")))
		.mount(&server)
		.await;

	let dir = tempfile::tempdir().unwrap();
	let secrets_path = dir.path().join("secrets.json");
	std::fs::write(&secrets_path, "version-one-content-longer-than-v2").unwrap();

	let client = client_for(&server);
	sync_once(&client, &secrets_path).await.unwrap();

	assert_eq!(std::fs::read_to_string(&secrets_path).unwrap(), "v2");
}

#[tokio::test]
async fn test_sync_once_propagates_missing_secret() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/workload/v1/secrets"))
		.respond_with(ResponseTemplate::new(404))
		.mount(&server)
		.await;

	let dir = tempfile::tempdir().unwrap();
	let secrets_path = dir.path().join("secrets.json");

	let client = client_for(&server);
	let result = sync_once(&client, &secrets_path).await;

	assert!(matches!(
		result,
		Err(SidecarError::Client(SecretsClientError::SecretNotFound))
	));
	assert!(!secrets_path.exists());
}

#[tokio::test]
async fn test_sync_cycle_recovers_after_transient_failures() {
	let server = MockServer::start().await;

	// First three cycles hit the outage, the fourth succeeds.
	Mock::given(method("GET"))
		.and(path("/workload/v1/secrets"))
		.respond_with(ResponseTemplate::new(500))
		.up_to_n_times(3)
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path("/workload/v1/secrets"))
		.respond_with(ResponseTemplate::new(200).set_body_string(fetch_body("recovered")))
		.mount(&server)
		.await;

	let dir = tempfile::tempdir().unwrap();
	let mut config = SidecarConfig::new(server.uri().parse().unwrap());
	config.secrets_path = dir.path().join("secrets.json");
	config.retry = RetryStrategy {
		max_retries: 5,
		delay: Duration::from_millis(1),
		exponential: false,
		max_wait: None,
	};

	let client = client_for(&server);
	sync_cycle(&client, &config).await.unwrap();

	assert_eq!(
		std::fs::read_to_string(&config.secrets_path).unwrap(),
		"recovered"
	);
}

#[tokio::test]
async fn test_watch_waits_poll_interval_between_cycles() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/workload/v1/secrets"))
		.respond_with(ResponseTemplate::new(200).set_body_string(fetch_body("steady")))
		.mount(&server)
		.await;

	let dir = tempfile::tempdir().unwrap();
	let mut config = SidecarConfig::new(server.uri().parse().unwrap());
	config.secrets_path = dir.path().join("secrets.json");
	config.poll_interval = Duration::from_millis(400);
	config.retry = RetryStrategy {
		max_retries: 0,
		delay: Duration::from_millis(1),
		exponential: false,
		max_wait: None,
	};

	let client = client_for(&server);
	let loop_task = tokio::spawn(async move { watch(&client, &config).await });

	// The first cycle fires right away; the second must not start until a
	// full poll interval has passed.
	tokio::time::sleep(Duration::from_millis(200)).await;
	assert_eq!(server.received_requests().await.unwrap().len(), 1);

	tokio::time::sleep(Duration::from_millis(400)).await;
	assert!(server.received_requests().await.unwrap().len() >= 2);

	loop_task.abort();
}

#[tokio::test]
async fn test_sync_cycle_returns_last_error_when_exhausted() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/workload/v1/secrets"))
		.respond_with(ResponseTemplate::new(503))
		.mount(&server)
		.await;

	let dir = tempfile::tempdir().unwrap();
	let mut config = SidecarConfig::new(server.uri().parse().unwrap());
	config.secrets_path = dir.path().join("secrets.json");
	config.retry = RetryStrategy {
		max_retries: 2,
		delay: Duration::from_millis(1),
		exponential: false,
		max_wait: None,
	};

	let client = client_for(&server);
	let result = sync_cycle(&client, &config).await;

	assert!(matches!(
		result,
		Err(SidecarError::Client(SecretsClientError::UnexpectedStatus(s))) if s.as_u16() == 503
	));
}
