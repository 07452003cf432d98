//! Stored environment records

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumIter, EnumString};

use crate::notify::EnvData;
use crate::results::now;

/// Test outcome tracked per environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(Serialize, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EnvStatus {
    Pass,
    Fail,
    Blocked,
    InProgress,
    #[default]
    #[serde(other)]
    Unknown,
}

impl EnvStatus {
    pub fn glyph(self) -> &'static str {
        match self {
            EnvStatus::Pass => "✅",
            EnvStatus::Fail => "❌",
            EnvStatus::Blocked => "🚫",
            EnvStatus::InProgress => "⏳",
            EnvStatus::Unknown => "❓",
        }
    }
}

/// One tracked environment, keyed by `cluster_name`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentRecord {
    pub cluster_name: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default = "now")]
    pub added_date: NaiveDateTime,
    #[serde(default = "now")]
    pub last_accessed: NaiveDateTime,
    #[serde(default)]
    pub status: EnvStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub data: EnvData,
    /// Fields written by other tools, kept on rewrite
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EnvironmentRecord {
    /// Record for `data` with both timestamps set to now
    pub fn new(data: EnvData, status: EnvStatus, notes: impl Into<String>) -> Self {
        let cluster = data.cluster.as_ref();
        let stamp = now();
        Self {
            cluster_name: cluster
                .map(|c| c.hub_cluster.clone())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "unknown".to_string()),
            platform: cluster
                .map(|c| c.platform.clone())
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| "unknown".to_string()),
            added_date: stamp,
            last_accessed: stamp,
            status,
            notes: notes.into(),
            data,
            extra: Map::new(),
        }
    }

    pub fn touch(&mut self) {
        self.last_accessed = now();
    }

    pub fn jira(&self) -> Option<&str> {
        self.data.notification.as_ref().and_then(|n| n.jira.as_deref())
    }

    pub fn polarion(&self) -> Option<&str> {
        self.data.notification.as_ref().and_then(|n| n.polarion.as_deref())
    }

    /// Case-insensitive match on name, platform, notes and ticket references
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        [
            Some(self.cluster_name.as_str()),
            Some(self.platform.as_str()),
            Some(self.notes.as_str()),
            self.jira(),
            self.polarion(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{ClusterInfo, NotificationInfo};
    use std::str::FromStr;

    #[test]
    fn test_status_strings() {
        assert_eq!(EnvStatus::InProgress.to_string(), "in_progress");
        assert_eq!(EnvStatus::from_str("blocked").unwrap(), EnvStatus::Blocked);
        assert!(EnvStatus::from_str("green").is_err());
        assert_eq!(serde_json::to_string(&EnvStatus::Pass).unwrap(), "\"pass\"");
    }

    #[test]
    fn test_unknown_status_value_loads() {
        let status: EnvStatus = serde_json::from_str("\"flaky\"").unwrap();
        assert_eq!(status, EnvStatus::Unknown);
    }

    #[test]
    fn test_new_without_cluster_uses_unknown() {
        let record = EnvironmentRecord::new(EnvData::default(), EnvStatus::Unknown, "");
        assert_eq!(record.cluster_name, "unknown");
        assert_eq!(record.platform, "unknown");
        assert_eq!(record.added_date, record.last_accessed);
    }

    #[test]
    fn test_matches_nested_ticket() {
        let data = EnvData {
            notification: Some(NotificationInfo {
                jira: Some("ACM-20417".into()),
                ..Default::default()
            }),
            cluster: Some(ClusterInfo {
                hub_cluster: "hub-1".into(),
                platform: "IBM Power".into(),
                ..Default::default()
            }),
        };
        let record = EnvironmentRecord::new(data, EnvStatus::Pass, "");
        assert!(record.matches("acm-204"));
        assert!(record.matches("POWER"));
        assert!(!record.matches("RHACM4K"));
    }

    #[test]
    fn test_microsecond_timestamps_and_extra_fields() {
        let json = r#"{
            "cluster_name": "hub-1",
            "platform": "AWS",
            "added_date": "2026-02-08T14:50:17.123456",
            "last_accessed": "2026-02-09T09:00:00",
            "status": "fail",
            "notes": "",
            "data": {"cluster": null},
            "owner_team": "capi"
        }"#;
        let record: EnvironmentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.status, EnvStatus::Fail);
        assert_eq!(record.extra["owner_team"], "capi");
        assert!(record.data.cluster.is_none());

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["owner_team"], "capi");
    }
}
