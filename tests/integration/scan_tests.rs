//! Integration tests for full sweeps
//!
//! These tests run the coordinator against a wiremock catalog and a
//! SQLite database in a temporary directory.

use futures::StreamExt;
use provider_sweep::config::{CatalogConfig, Config, OutputConfig, ScannerConfig, ScheduleConfig};
use provider_sweep::scanner::COMPLETION_LINE;
use provider_sweep::{
    RunStatus, ScanCoordinator, ScanRequest, ScanService, SqliteStorage, TriggerKind,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock catalog
fn create_test_config(base_url: &str, db_path: &str) -> Config {
    Config {
        catalog: CatalogConfig {
            base_url: base_url.to_string(),
            api_key: "test-client".to_string(),
            request_timeout_ms: 200,
        },
        scanner: ScannerConfig {
            concurrency: 4,
            retry_attempts: 2,
            backoff_base_ms: 10,
        },
        schedule: ScheduleConfig::default(),
        output: OutputConfig {
            database_path: db_path.to_string(),
        },
    }
}

fn setup(server: &MockServer) -> (TempDir, Arc<SqliteStorage>, ScanCoordinator) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("providers.db");
    let config = create_test_config(&server.uri(), db_path.to_str().unwrap());

    let storage = Arc::new(SqliteStorage::new(&db_path).expect("Failed to open database"));
    let coordinator =
        ScanCoordinator::from_config(&config, Some("test-hash".to_string()), storage.clone())
            .expect("Failed to build coordinator");

    (dir, storage, coordinator)
}

fn provider_payload(id: i64, name: &str) -> serde_json::Value {
    json!({
        "_embedded": {
            "termine": [{
                "angebot": {
                    "bildungsanbieter": {"id": id, "name": name, "homepage": "https://a.example"}
                }
            }]
        }
    })
}

/// 1000 holds provider 4242, 1001 is always unavailable, 1002 never answers in time
async fn mount_mixed_catalog(server: &MockServer) {
    Mock::given(method("GET"))
        .and(query_param("ban", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(provider_payload(4242, "Bildungswerk")))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("ban", "1001"))
        .respond_with(ResponseTemplate::new(503))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("ban", "1002"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_mixed_range_sweep() {
    let server = MockServer::start().await;
    mount_mixed_catalog(&server).await;
    let (_dir, storage, coordinator) = setup(&server);

    let request = ScanRequest::new(1000, 1002, TriggerKind::Manual).unwrap();
    let summary = coordinator.run(&request).await;

    assert_eq!(summary.counters.processed, 3);
    assert_eq!(summary.counters.new_or_updated, 1);
    assert_eq!(summary.counters.timeouts, 1);
    assert_eq!(summary.counters.http_errors, 1);
    assert_eq!(summary.status, RunStatus::CompletedWithErrors);

    // Stored under the record's own ID, not the scanned one
    let stored = storage.provider(4242).unwrap().expect("provider 4242 stored");
    assert_eq!(stored.name, "Bildungswerk");
    assert_eq!(storage.provider(1000).unwrap(), None);

    let runs = storage.latest_runs(5).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::CompletedWithErrors);
    assert_eq!(runs[0].trigger_kind, TriggerKind::Manual);
    assert_eq!(runs[0].counters, summary.counters);
    assert_eq!(runs[0].config_hash.as_deref(), Some("test-hash"));
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("ban", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(provider_payload(1, "Eins")))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let (_dir, storage, coordinator) = setup(&server);
    let request = ScanRequest::new(1, 10, TriggerKind::Scheduled).unwrap();

    let first = coordinator.run(&request).await;
    let second = coordinator.run(&request).await;

    assert_eq!(first.counters.new_or_updated, 1);
    assert_eq!(second.counters.new_or_updated, 1);
    assert_eq!(first.counters.new_providers, 1);
    assert_eq!(second.counters.new_providers, 0);
    assert_eq!(first.counters.not_found, 9);
    assert_eq!(second.counters.not_found, 9);
    assert_eq!(second.status, RunStatus::Completed);
    assert_eq!(storage.provider_count().unwrap(), 1);
    assert_eq!(storage.run_count().unwrap(), 2);
}

#[tokio::test]
async fn test_empty_appointments_are_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"_embedded": {"termine": []}})))
        .mount(&server)
        .await;

    let (_dir, storage, coordinator) = setup(&server);
    let request = ScanRequest::new(7, 7, TriggerKind::Manual).unwrap();

    let summary = coordinator.run(&request).await;

    assert_eq!(summary.counters.processed, 1);
    assert_eq!(summary.counters.malformed, 1);
    assert_eq!(summary.counters.new_or_updated, 0);
    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(storage.provider_count().unwrap(), 0);
}

#[tokio::test]
async fn test_stream_reports_every_id_then_completes() {
    let server = MockServer::start().await;
    mount_mixed_catalog(&server).await;
    let (_dir, storage, coordinator) = setup(&server);
    let service = ScanService::new(coordinator);

    let frames: Vec<String> = service.stream(1000, 1002).unwrap().into_sse().collect().await;

    assert_eq!(frames.len(), 4);
    assert_eq!(frames.last().unwrap(), &format!("data: {}\n\n", COMPLETION_LINE));
    assert!(frames.contains(&"data: Provider ID 1000: data processed successfully.\n\n".to_string()));
    assert!(frames.contains(&"data: Provider ID 1001: error fetching data (status code: 503).\n\n".to_string()));
    assert!(frames.contains(&"data: Provider ID 1002: timeout.\n\n".to_string()));
    assert_eq!(storage.run_count().unwrap(), 1);
}

#[tokio::test]
async fn test_manual_trigger_lands_in_run_log() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let (_dir, storage, coordinator) = setup(&server);
    let service = ScanService::new(coordinator);

    let ack = service.trigger_manual(1, 25).unwrap();
    assert_eq!(ack.message(), "Processing started for provider IDs 1 to 25.");

    let summary = ack.wait().await.unwrap();

    assert_eq!(summary.counters.processed, 25);
    assert_eq!(storage.latest_runs(1).unwrap()[0].counters.processed, 25);
}
