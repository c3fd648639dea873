use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreadStatus {
    Active,
    Archived,
    Completed,
}

/// A conversation container grouping an ordered sequence of messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub title: String,
    pub status: ThreadStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Default for Thread {
    fn default() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: String::new(),
            status: ThreadStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            unread_count: 0,
            last_message: None,
            metadata: serde_json::Map::new(),
        }
    }
}

/// Per-thread telemetry about server-side context-window trimming
///
/// One record per thread, overwritten wholesale on each update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContextOptimization {
    pub truncated_messages: u32,
    /// Fraction of the model context window in use, in [0, 1]
    pub window_utilization: f32,
}
