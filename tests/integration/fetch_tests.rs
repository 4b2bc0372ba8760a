//! Integration tests for catalog lookups
//!
//! These tests use wiremock to stand in for the catalog API and exercise
//! the retry, timeout and classification behavior of a single lookup.

use provider_sweep::config::CatalogConfig;
use provider_sweep::scanner::{CatalogClient, ProviderFetcher, RetryPolicy};
use provider_sweep::{FetchOutcome, SweepError};
use serde_json::json;
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn catalog_config(base_url: &str, timeout_ms: u64) -> CatalogConfig {
    CatalogConfig {
        base_url: base_url.to_string(),
        api_key: "test-client".to_string(),
        request_timeout_ms: timeout_ms,
    }
}

fn client(server: &MockServer, attempts: u32, backoff_ms: u64) -> CatalogClient {
    CatalogClient::new(
        &catalog_config(&server.uri(), 2_000),
        RetryPolicy::new(attempts, Duration::from_millis(backoff_ms)),
    )
    .expect("Failed to build catalog client")
}

fn provider_payload(id: i64, name: &str) -> serde_json::Value {
    json!({
        "_embedded": {
            "termine": [{
                "angebot": {
                    "bildungsanbieter": {
                        "id": id,
                        "name": name,
                        "telefonVorwahl": "030",
                        "telefondurchwahl": 123456,
                        "homepage": "https://anbieter.example",
                        "email": "info@anbieter.example"
                    }
                }
            }]
        }
    })
}

#[tokio::test]
async fn test_lookup_sends_api_key_and_provider_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("ban", "1001"))
        .and(header("X-API-Key", "test-client"))
        .respond_with(ResponseTemplate::new(200).set_body_json(provider_payload(1001, "Akademie")))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client(&server, 3, 10).fetch(1001).await;

    match outcome {
        FetchOutcome::Success(record) => {
            assert_eq!(record.id, 1001);
            assert_eq!(record.name, "Akademie");
            assert_eq!(record.area_code.as_deref(), Some("030"));
            assert_eq!(record.extension.as_deref(), Some("123456"));
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_transient_status_is_retried_until_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(provider_payload(5, "Late")))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client(&server, 5, 10).fetch(5).await;

    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_exhausted_retries_report_last_status_after_backoff() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let started = Instant::now();
    let outcome = client(&server, 3, 50).fetch(1).await;

    assert_eq!(outcome, FetchOutcome::HttpError(502));
    // 50ms after the first failure, 100ms after the second
    assert!(started.elapsed() >= Duration::from_millis(150));
}

#[tokio::test]
async fn test_non_retryable_status_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client(&server, 5, 10).fetch(9).await;

    assert_eq!(outcome, FetchOutcome::HttpError(404));
}

#[tokio::test]
async fn test_non_ok_success_status_is_an_http_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client(&server, 5, 10).fetch(9).await;

    assert_eq!(outcome, FetchOutcome::HttpError(204));
}

#[tokio::test]
async fn test_retry_after_overrides_backoff() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(provider_payload(3, "Patient")))
        .mount(&server)
        .await;

    // A 60s computed backoff would blow the deadline
    let client = client(&server, 2, 60_000);
    let outcome = tokio::time::timeout(Duration::from_secs(5), client.fetch(3))
        .await
        .expect("Retry-After was not honoured");

    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_slow_catalog_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .expect(2)
        .mount(&server)
        .await;

    let client = CatalogClient::new(
        &catalog_config(&server.uri(), 100),
        RetryPolicy::new(2, Duration::from_millis(10)),
    )
    .unwrap();

    assert_eq!(client.fetch(11).await, FetchOutcome::Timeout);
}

#[tokio::test]
async fn test_unreachable_catalog_is_a_transport_failure() {
    let client = CatalogClient::new(
        &catalog_config("http://127.0.0.1:1/v2/bildungsangebot", 500),
        RetryPolicy::new(2, Duration::from_millis(10)),
    )
    .unwrap();

    assert!(matches!(client.fetch(1).await, FetchOutcome::Transport(_)));
}

#[tokio::test]
async fn test_payload_shapes_are_classified() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("ban", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"page": {"totalElements": 0}})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("ban", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"_embedded": {"termine": []}})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("ban", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = client(&server, 3, 10);

    assert_eq!(client.fetch(1).await, FetchOutcome::NotFound);
    assert_eq!(client.fetch(2).await, FetchOutcome::MalformedPayload);
    assert_eq!(client.fetch(3).await, FetchOutcome::MalformedPayload);
}

#[tokio::test]
async fn test_count_pages_queries_first_page_with_filters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("page", "0"))
        .and(query_param("size", "20"))
        .and(query_param("sw", "Pflege"))
        .and(header("X-API-Key", "test-client"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": {"size": 20, "totalElements": 412, "totalPages": 21, "number": 0}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let count = client(&server, 1, 10)
        .count_pages(&[("sw".to_string(), "Pflege".to_string())])
        .await
        .unwrap();

    assert_eq!(count.total_pages, 21);
    assert_eq!(count.total_elements, 412);
}

#[tokio::test]
async fn test_count_pages_rejects_unknown_filter() {
    let server = MockServer::start().await;

    let result = client(&server, 1, 10)
        .count_pages(&[("colour".to_string(), "blue".to_string())])
        .await;

    assert!(matches!(result, Err(SweepError::UnknownFilter(key)) if key == "colour"));
}
