//! Provider record extraction
//!
//! The catalog nests the provider three levels deep:
//! `_embedded.termine[0].angebot.bildungsanbieter`. Only the first
//! appointment entry is read.

use crate::scanner::types::{FetchOutcome, ProviderRecord};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Why a 200 payload did not yield a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("no data found")]
    NotFound,

    #[error("no valid data found")]
    Malformed,
}

impl From<ExtractError> for FetchOutcome {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::NotFound => FetchOutcome::NotFound,
            ExtractError::Malformed => FetchOutcome::MalformedPayload,
        }
    }
}

/// Pulls the provider record out of a catalog search response
pub fn extract_provider(payload: &Value) -> Result<ProviderRecord, ExtractError> {
    let embedded = payload
        .as_object()
        .and_then(|obj| obj.get("_embedded"))
        .ok_or(ExtractError::NotFound)?;

    let provider = embedded
        .get("termine")
        .and_then(Value::as_array)
        .and_then(|entries| entries.first())
        .and_then(|entry| entry.get("angebot"))
        .and_then(|offer| offer.get("bildungsanbieter"))
        .ok_or(ExtractError::Malformed)?;

    ProviderRecord::deserialize(provider).map_err(|_| ExtractError::Malformed)
}

/// Parses a raw response body and classifies it
pub fn classify_body(body: &str) -> FetchOutcome {
    match serde_json::from_str::<Value>(body) {
        Ok(payload) => match extract_provider(&payload) {
            Ok(record) => FetchOutcome::Success(record),
            Err(err) => err.into(),
        },
        Err(_) => FetchOutcome::MalformedPayload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload_with(entries: Value) -> Value {
        json!({ "_embedded": { "termine": entries }, "page": { "totalElements": 1 } })
    }

    #[test]
    fn test_extracts_first_entry() {
        let payload = payload_with(json!([
            { "angebot": { "bildungsanbieter": { "id": 4242, "name": "First" } } },
            { "angebot": { "bildungsanbieter": { "id": 5353, "name": "Second" } } }
        ]));

        let record = extract_provider(&payload).unwrap();
        assert_eq!(record.id, 4242);
        assert_eq!(record.name, "First");
        assert_eq!(record.homepage, None);
    }

    #[test]
    fn test_missing_embedded_is_not_found() {
        assert_eq!(
            extract_provider(&json!({ "page": { "totalElements": 0 } })),
            Err(ExtractError::NotFound)
        );
        assert_eq!(extract_provider(&Value::Null), Err(ExtractError::NotFound));
        assert_eq!(extract_provider(&json!([])), Err(ExtractError::NotFound));
    }

    #[test]
    fn test_empty_collection_is_malformed() {
        let payload = payload_with(json!([]));
        assert_eq!(extract_provider(&payload), Err(ExtractError::Malformed));
    }

    #[test]
    fn test_broken_nested_path_is_malformed() {
        let no_offer = payload_with(json!([{ "id": 1 }]));
        assert_eq!(extract_provider(&no_offer), Err(ExtractError::Malformed));

        let no_provider = payload_with(json!([{ "angebot": { "titel": "Kurs" } }]));
        assert_eq!(extract_provider(&no_provider), Err(ExtractError::Malformed));

        let no_name = payload_with(json!([{ "angebot": { "bildungsanbieter": { "id": 9 } } }]));
        assert_eq!(extract_provider(&no_name), Err(ExtractError::Malformed));

        let null_embedded = json!({ "_embedded": null });
        assert_eq!(extract_provider(&null_embedded), Err(ExtractError::Malformed));
    }

    #[test]
    fn test_classify_body() {
        assert_eq!(classify_body("<html>oops</html>"), FetchOutcome::MalformedPayload);
        assert_eq!(classify_body("{}"), FetchOutcome::NotFound);
        assert_eq!(
            classify_body(r#"{"_embedded":{"termine":[]}}"#),
            FetchOutcome::MalformedPayload
        );

        let body = r#"{"_embedded":{"termine":[{"angebot":{"bildungsanbieter":{"id":3,"name":"C","email":"c@example.com"}}}]}}"#;
        let mut expected = ProviderRecord::new(3, "C");
        expected.email = Some("c@example.com".to_string());
        assert_eq!(classify_body(body), FetchOutcome::Success(expected));
    }
}
