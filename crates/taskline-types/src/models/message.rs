use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::thread::ContextOptimization;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    #[default]
    Text,
    TaskBreakdown,
    Progress,
    Notification,
    Error,
}

/// A single chat message belonging to a thread
///
/// Metadata may carry attachment descriptors and a `context_optimization`
/// object attached by the server to finalized assistant messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub message_type: MessageType,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            thread_id: String::new(),
            role: MessageRole::Assistant,
            content: String::new(),
            message_type: MessageType::Text,
            created_at: Utc::now(),
            edited_at: None,
            metadata: serde_json::Map::new(),
        }
    }
}

impl Message {
    /// Context-optimization telemetry carried in metadata, if any
    pub fn context_optimization(&self) -> Option<ContextOptimization> {
        let value = self.metadata.get("context_optimization")?;
        serde_json::from_value(value.clone()).ok()
    }
}

/// Descriptor for a file attached to a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
