use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::UserId;

/// One recorded user action.
///
/// Only `activityTime` is interpreted; every other field passes through
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Epoch milliseconds
    #[serde(rename = "activityTime")]
    pub activity_time: i64,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ActivityRecord {
    pub fn new(activity_time: i64) -> Self {
        Self {
            activity_time,
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn activity_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.activity_time)
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.fields.get("userId").and_then(Value::as_u64).map(UserId)
    }

    pub fn username(&self) -> Option<&str> {
        self.fields.get("username").and_then(Value::as_str)
    }

    pub fn activity_type(&self) -> Option<&str> {
        self.fields.get("activityType").and_then(Value::as_str)
    }

    /// Convert raw fetched values, dropping any whose `activityTime` is not
    /// an integral epoch value so that ordering stays total downstream.
    pub fn normalize(values: Vec<Value>) -> Vec<ActivityRecord> {
        let total = values.len();
        let records: Vec<ActivityRecord> = values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Rejected activity record at index {index}: {e}");
                    None
                }
            })
            .collect();

        if records.len() < total {
            tracing::warn!(
                "Dropped {} of {} activity records with unusable activityTime",
                total - records.len(),
                total
            );
        }
        records
    }
}
