use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use taskline_types::{Attachment, Message, Notification, Thread, ThreadStatus};

use crate::error::{Result, SyncError};

/// Partial update for a thread; `None` fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ThreadStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

/// REST surface consumed by the state store
///
/// `list_messages` returns pages newest-first; the store is responsible for
/// reordering. Implementations must map non-2xx responses to
/// [`SyncError::Status`] with the body preserved.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn create_thread(&self, title: &str, initial_message: Option<&str>) -> Result<Thread>;

    async fn list_threads(&self) -> Result<Vec<Thread>>;

    async fn update_thread(&self, thread_id: &str, patch: &ThreadPatch) -> Result<Thread>;

    async fn delete_thread(&self, thread_id: &str) -> Result<()>;

    /// Fetch a page of messages, newest-first; `before` backfills older pages
    async fn list_messages(&self, thread_id: &str, before: Option<&str>) -> Result<Vec<Message>>;

    async fn send_message(
        &self,
        thread_id: &str,
        content: &str,
        attachments: &[Attachment],
    ) -> Result<Message>;

    async fn list_notifications(&self) -> Result<Vec<Notification>>;

    /// Best-effort read acknowledgment; callers treat failure as non-blocking
    async fn mark_notifications_read(&self, thread_id: &str) -> Result<()>;
}

#[derive(Serialize)]
struct CreateThreadRequest<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    initial_message: Option<&'a str>,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    attachments: &'a [Attachment],
}

/// reqwest-backed implementation against `{base_url}/api/...`
pub struct HttpChatApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpChatApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }
}

async fn into_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(SyncError::Status { status, body })
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn create_thread(&self, title: &str, initial_message: Option<&str>) -> Result<Thread> {
        let response = self
            .client
            .post(self.url("/threads"))
            .json(&CreateThreadRequest {
                title,
                initial_message,
            })
            .send()
            .await?;
        Ok(into_success(response).await?.json().await?)
    }

    async fn list_threads(&self) -> Result<Vec<Thread>> {
        let response = self.client.get(self.url("/threads")).send().await?;
        Ok(into_success(response).await?.json().await?)
    }

    async fn update_thread(&self, thread_id: &str, patch: &ThreadPatch) -> Result<Thread> {
        let response = self
            .client
            .patch(self.url(&format!("/threads/{}", thread_id)))
            .json(patch)
            .send()
            .await?;
        Ok(into_success(response).await?.json().await?)
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/threads/{}", thread_id)))
            .send()
            .await?;
        into_success(response).await?;
        Ok(())
    }

    async fn list_messages(&self, thread_id: &str, before: Option<&str>) -> Result<Vec<Message>> {
        let mut request = self
            .client
            .get(self.url(&format!("/threads/{}/messages", thread_id)));
        if let Some(before_id) = before {
            request = request.query(&[("before", before_id)]);
        }
        let response = request.send().await?;
        Ok(into_success(response).await?.json().await?)
    }

    async fn send_message(
        &self,
        thread_id: &str,
        content: &str,
        attachments: &[Attachment],
    ) -> Result<Message> {
        let response = self
            .client
            .post(self.url(&format!("/threads/{}/messages", thread_id)))
            .json(&SendMessageRequest {
                content,
                attachments,
            })
            .send()
            .await?;
        Ok(into_success(response).await?.json().await?)
    }

    async fn list_notifications(&self) -> Result<Vec<Notification>> {
        let response = self.client.get(self.url("/notifications")).send().await?;
        Ok(into_success(response).await?.json().await?)
    }

    async fn mark_notifications_read(&self, thread_id: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url(&format!("/threads/{}/read", thread_id)))
            .send()
            .await?;
        into_success(response).await?;
        Ok(())
    }
}
