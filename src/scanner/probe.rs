//! Catalog page-count probe
//!
//! Asks the catalog how many result pages a filtered search would return,
//! without sweeping anything.

use crate::scanner::fetcher::{CatalogClient, API_KEY_HEADER};
use crate::SweepError;
use serde::Deserialize;

/// Filter parameters the catalog search accepts
pub const CATALOG_FILTERS: [&str; 16] = [
    "sys",
    "sw",
    "ssw",
    "ids",
    "orte",
    "uk",
    "ortsunabhaengig",
    "re",
    "bt",
    "uz",
    "dauer",
    "uf",
    "ban",
    "it",
    "bg",
    "sort",
];

/// Page size used for the probe query
pub const PROBE_PAGE_SIZE: u32 = 20;

/// Size of a filtered catalog search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PageCount {
    #[serde(rename = "totalPages", default)]
    pub total_pages: u64,

    #[serde(rename = "totalElements", default)]
    pub total_elements: u64,
}

#[derive(Deserialize)]
struct SearchPage {
    #[serde(default)]
    page: Option<PageCount>,
}

/// Rejects filter keys the catalog does not know
pub fn validate_filters(filters: &[(String, String)]) -> Result<(), SweepError> {
    match filters
        .iter()
        .find(|(key, _)| !CATALOG_FILTERS.contains(&key.as_str()))
    {
        Some((key, _)) => Err(SweepError::UnknownFilter(key.clone())),
        None => Ok(()),
    }
}

impl CatalogClient {
    /// Queries page 0 with the given filters and reads the paging block
    ///
    /// This is a single request; the retry policy does not apply.
    pub async fn count_pages(&self, filters: &[(String, String)]) -> Result<PageCount, SweepError> {
        validate_filters(filters)?;

        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("page", "0")
                .append_pair("size", &PROBE_PAGE_SIZE.to_string());
            for (key, value) in filters {
                query.append_pair(key, value);
            }
        }

        tracing::debug!("Probing catalog: {}", url);

        let response = self
            .client
            .get(url.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SweepError::CatalogStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let page: SearchPage =
            serde_json::from_str(&body).map_err(|e| SweepError::Payload(e.to_string()))?;

        Ok(page.page.unwrap_or_default())
    }
}
