//! Export / import envelope.
//!
//! ```json
//! { "exportDate": "2026-10-17T09:30:00Z", "version": "1.0",
//!   "data": { "enabled": true, "interval": 60, "streak": 3, ... } }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::storage::StorageMap;

pub const SNAPSHOT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSnapshot {
    pub export_date: DateTime<Utc>,
    pub version: String,
    /// Settings and stats keys, flattened.
    pub data: StorageMap,
}

impl ExportSnapshot {
    pub fn new(data: StorageMap, export_date: DateTime<Utc>) -> Self {
        Self {
            export_date,
            version: SNAPSHOT_VERSION.to_string(),
            data,
        }
    }
}

/// The `data` object of an importable snapshot.
///
/// `None` unless `version` is exactly `"1.0"` and `data` is an object.
pub fn accepted_data(raw: &Value) -> Option<&StorageMap> {
    if raw.get("version").and_then(Value::as_str) != Some(SNAPSHOT_VERSION) {
        return None;
    }
    raw.get("data").and_then(Value::as_object)
}
