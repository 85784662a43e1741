use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An application deployed into an environment.
///
/// Field names follow the inventory API payload. Every field is optional on
/// the wire, so missing values fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub full_domain: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub workers: Workers,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub last_update_time: i64,
    #[serde(default)]
    pub mule_version: RuntimeVersion,
}

impl Application {
    /// Last deployment update as a timestamp, if the remote reported one.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        if self.last_update_time <= 0 {
            return None;
        }
        DateTime::from_timestamp_millis(self.last_update_time)
    }
}

/// Worker allocation for an application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workers {
    #[serde(rename = "type", default)]
    pub kind: WorkerType,
    #[serde(default)]
    pub amount: u32,
    #[serde(default)]
    pub remaining_org_workers: f64,
    #[serde(default)]
    pub total_org_workers: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerType {
    #[serde(default)]
    pub cpu: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeVersion {
    #[serde(default)]
    pub version: String,
}
