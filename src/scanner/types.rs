//! Value types shared by the scanner components

use crate::SweepError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::ops::RangeInclusive;

/// What started a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    Manual,
    Scheduled,
}

impl TriggerKind {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Scheduled => "scheduled",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(Self::Manual),
            "scheduled" => Some(Self::Scheduled),
            _ => None,
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// An inclusive range of provider IDs to sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    start_id: i64,
    end_id: i64,
    trigger_kind: TriggerKind,
}

impl ScanRequest {
    /// Creates a request, rejecting ranges whose end lies below their start
    pub fn new(start_id: i64, end_id: i64, trigger_kind: TriggerKind) -> Result<Self, SweepError> {
        if end_id < start_id {
            return Err(SweepError::InvalidRange { start_id, end_id });
        }

        Ok(Self {
            start_id,
            end_id,
            trigger_kind,
        })
    }

    pub fn start_id(&self) -> i64 {
        self.start_id
    }

    pub fn end_id(&self) -> i64 {
        self.end_id
    }

    pub fn trigger_kind(&self) -> TriggerKind {
        self.trigger_kind
    }

    /// Number of IDs in the range
    pub fn len(&self) -> u64 {
        u64::try_from(self.end_id as i128 - self.start_id as i128 + 1).unwrap_or(u64::MAX)
    }

    /// Always false; a request covers at least one ID
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn ids(&self) -> RangeInclusive<i64> {
        self.start_id..=self.end_id
    }
}

/// Provider fields persisted from the catalog's `bildungsanbieter` object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub id: i64,

    pub name: String,

    /// Telephone area code
    #[serde(rename = "telefonVorwahl", default, deserialize_with = "lenient_string")]
    pub area_code: Option<String>,

    /// Telephone extension
    #[serde(
        rename = "telefondurchwahl",
        alias = "telefonDurchwahl",
        default,
        deserialize_with = "lenient_string"
    )]
    pub extension: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub homepage: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
}

impl ProviderRecord {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            area_code: None,
            extension: None,
            homepage: None,
            email: None,
        }
    }
}

/// Accepts strings and numbers; anything else becomes `None`
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Classified result of looking up one provider ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The catalog returned a provider record
    Success(ProviderRecord),

    /// The response carried no embedded results
    NotFound,

    /// Embedded results were present but the provider path was not
    MalformedPayload,

    /// Terminal non-200 status, including retryable ones that ran out of attempts
    HttpError(u16),

    /// The final attempt timed out
    Timeout,

    /// Connection-level failure on the final attempt
    Transport(String),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}
