use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reminder for an upcoming mold change, kept in client-local storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledChange {
    pub id: String,
    pub date: DateTime<Utc>,
    pub mold_id: String,
    pub description: String,
    pub line: String,
}

/// Operator notes about the mold currently mounted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentMoldInfo {
    #[serde(default)]
    pub mold_id: String,
    #[serde(default)]
    pub cycle_time: String,
    #[serde(default)]
    pub description: String,
}
