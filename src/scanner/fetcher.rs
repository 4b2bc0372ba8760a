//! HTTP fetcher for catalog lookups
//!
//! This module handles all requests against the catalog API:
//! - Building the HTTP client with the per-attempt timeout
//! - One GET per provider ID with the API key header
//! - Retry with exponential backoff on transient failures
//! - Classifying the final response into a `FetchOutcome`
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | HTTP 200 | Extract provider → Success / NotFound / MalformedPayload |
//! | HTTP 429, 500, 502, 503, 504 | Retry; exhausted → HttpError(status) |
//! | Other status | Immediate → HttpError(status) |
//! | Timeout | Retry; final attempt → Timeout |
//! | Connection error | Retry; exhausted → Transport |

use crate::config::CatalogConfig;
use crate::scanner::extractor::classify_body;
use crate::scanner::retry::{parse_retry_after, RetryPolicy};
use crate::scanner::types::FetchOutcome;
use crate::SweepError;
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Header carrying the catalog client ID
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Query parameter the catalog filters providers by
pub const PROVIDER_QUERY_PARAM: &str = "ban";

/// Looks up a single provider ID
///
/// Implementations must not share mutable state between calls; the
/// coordinator runs many lookups at once.
#[async_trait]
pub trait ProviderFetcher: Send + Sync {
    async fn fetch(&self, provider_id: i64) -> FetchOutcome;
}

/// Builds an HTTP client for the catalog
///
/// `timeout` bounds each attempt, not the whole retry sequence.
pub fn build_http_client(config: &CatalogConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("provider-sweep/", env!("CARGO_PKG_VERSION")))
        .timeout(config.request_timeout())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Catalog API client
pub struct CatalogClient {
    pub(crate) client: Client,
    pub(crate) base_url: Url,
    pub(crate) api_key: String,
    policy: RetryPolicy,
}

/// A failed attempt that may be retried
#[derive(Debug)]
enum Retryable {
    Status {
        status: u16,
        retry_after: Option<Duration>,
    },
    Timeout,
    Connect(String),
}

impl Retryable {
    fn into_outcome(self) -> FetchOutcome {
        match self {
            Self::Status { status, .. } => FetchOutcome::HttpError(status),
            Self::Timeout => FetchOutcome::Timeout,
            Self::Connect(reason) => FetchOutcome::Transport(reason),
        }
    }
}

enum Attempt {
    Done(FetchOutcome),
    Retry(Retryable),
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig, policy: RetryPolicy) -> Result<Self, SweepError> {
        Ok(Self {
            client: build_http_client(config)?,
            base_url: Url::parse(&config.base_url)?,
            api_key: config.api_key.clone(),
            policy,
        })
    }

    /// URL for one provider lookup: `<base>?ban=<id>`
    pub fn provider_url(&self, provider_id: i64) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair(PROVIDER_QUERY_PARAM, &provider_id.to_string());
        url
    }

    async fn attempt(&self, url: &Url) -> Attempt {
        let response = match self
            .client
            .get(url.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return classify_send_error(e),
        };

        let status = response.status();

        if status == StatusCode::OK {
            return match response.text().await {
                Ok(body) => Attempt::Done(classify_body(&body)),
                Err(e) if e.is_timeout() => Attempt::Retry(Retryable::Timeout),
                Err(e) => Attempt::Retry(Retryable::Connect(e.to_string())),
            };
        }

        if RetryPolicy::is_retryable_status(status.as_u16()) {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);

            return Attempt::Retry(Retryable::Status {
                status: status.as_u16(),
                retry_after,
            });
        }

        Attempt::Done(FetchOutcome::HttpError(status.as_u16()))
    }
}

#[async_trait]
impl ProviderFetcher for CatalogClient {
    async fn fetch(&self, provider_id: i64) -> FetchOutcome {
        let url = self.provider_url(provider_id);
        let mut attempt = 1;

        loop {
            tracing::debug!("Fetching provider {} (attempt {})", provider_id, attempt);

            let failure = match self.attempt(&url).await {
                Attempt::Done(outcome) => return outcome,
                Attempt::Retry(failure) => failure,
            };

            if !self.policy.has_attempts_left(attempt) {
                tracing::debug!(
                    "Provider {} gave up after {} attempts: {:?}",
                    provider_id,
                    attempt,
                    failure
                );
                return failure.into_outcome();
            }

            let delay = match &failure {
                Retryable::Status {
                    retry_after: Some(wait),
                    ..
                } => *wait,
                _ => self.policy.backoff_delay(attempt),
            };

            tracing::warn!(
                "Provider {} attempt {} failed ({:?}), retrying in {:?}",
                provider_id,
                attempt,
                failure,
                delay
            );

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

fn classify_send_error(e: reqwest::Error) -> Attempt {
    if e.is_timeout() {
        Attempt::Retry(Retryable::Timeout)
    } else if e.is_connect() || e.is_request() {
        Attempt::Retry(Retryable::Connect(e.to_string()))
    } else {
        Attempt::Done(FetchOutcome::Transport(e.to_string()))
    }
}
