//! Rows returned by the cache repositories.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::ResultBundle;

/// Live cache row; one per search configuration.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub value: ResultBundle,
    pub created_at: DateTime<Utc>,
}

/// Audit row, appended once per executed search.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionLogEntry {
    pub id: i64,
    pub key: String,
    pub value: ResultBundle,
    pub logged_at: DateTime<Utc>,
}
