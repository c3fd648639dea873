use serde::{Deserialize, Serialize};

use crate::models::{Message, Thread};

/// Push events from the server, decoded once at the transport boundary
///
/// Closed sum type over the known chat-domain event kinds so downstream
/// handlers get exhaustiveness checking instead of a string-tag fallthrough.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    ThreadCreated { thread: Thread },
    ThreadUpdated { thread: Thread },
    ThreadDeleted { thread_id: String },
    MessageSent { message: Message },
    NotificationsRead { thread_id: String },
}

/// Wire shape of an inbound frame: `{ type, timestamp, data }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventFrame {
    pub timestamp: i64,
    #[serde(flatten)]
    pub event: ServerEvent,
}

/// Outbound frames sent over the same connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientFrame {
    Subscribe { thread_id: String },
    Ping,
}

/// One increment of an in-progress assistant response
///
/// Exactly one of the two fields is meaningful per chunk: `delta` appends to
/// the accumulated text, `content` replaces it wholesale (corrective resync).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl StreamChunk {
    pub fn delta(text: impl Into<String>) -> Self {
        Self {
            delta: Some(text.into()),
            content: None,
        }
    }

    pub fn replace(text: impl Into<String>) -> Self {
        Self {
            delta: None,
            content: Some(text.into()),
        }
    }
}
