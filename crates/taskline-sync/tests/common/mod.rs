#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use taskline_sync::api::{ChatApi, ThreadPatch};
use taskline_sync::error::{Result, SyncError};
use taskline_types::{Attachment, Message, MessageRole, Notification, Thread, ThreadStatus};

/// Scripted REST double: queued responses, recorded calls, toggleable failures
#[derive(Default)]
pub struct MockApi {
    pub fail_create: AtomicBool,
    pub fail_list_threads: AtomicBool,
    pub fail_mark_read: AtomicBool,
    pub fail_send: AtomicBool,
    /// Results handed out by `list_threads`
    pub threads: Mutex<Vec<Thread>>,
    /// Pages handed out by `list_messages`, newest-first, popped per call
    pub message_pages: Mutex<VecDeque<Vec<Message>>>,
    /// Thread ids passed to `mark_notifications_read`
    pub read_acks: Mutex<Vec<String>>,
    /// (thread_id, before) pairs passed to `list_messages`
    pub message_fetches: Mutex<Vec<(String, Option<String>)>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_page(&self, page: Vec<Message>) {
        self.message_pages.lock().unwrap().push_back(page);
    }
}

fn failed(flag: &AtomicBool, what: &str) -> Result<()> {
    if flag.load(Ordering::SeqCst) {
        Err(SyncError::Internal(format!("{} failed", what)))
    } else {
        Ok(())
    }
}

#[async_trait]
impl ChatApi for MockApi {
    async fn create_thread(&self, title: &str, _initial_message: Option<&str>) -> Result<Thread> {
        failed(&self.fail_create, "create_thread")?;
        Ok(thread("t1", title))
    }

    async fn list_threads(&self) -> Result<Vec<Thread>> {
        failed(&self.fail_list_threads, "list_threads")?;
        Ok(self.threads.lock().unwrap().clone())
    }

    async fn update_thread(&self, thread_id: &str, patch: &ThreadPatch) -> Result<Thread> {
        let mut updated = thread(thread_id, "updated");
        if let Some(title) = &patch.title {
            updated.title = title.clone();
        }
        if let Some(status) = patch.status {
            updated.status = status;
        }
        Ok(updated)
    }

    async fn delete_thread(&self, _thread_id: &str) -> Result<()> {
        Ok(())
    }

    async fn list_messages(&self, thread_id: &str, before: Option<&str>) -> Result<Vec<Message>> {
        self.message_fetches
            .lock()
            .unwrap()
            .push((thread_id.to_string(), before.map(String::from)));
        Ok(self
            .message_pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn send_message(
        &self,
        thread_id: &str,
        content: &str,
        _attachments: &[Attachment],
    ) -> Result<Message> {
        failed(&self.fail_send, "send_message")?;
        Ok(Message {
            id: format!("srv-{}", content),
            thread_id: thread_id.to_string(),
            role: MessageRole::User,
            content: content.to_string(),
            ..Message::default()
        })
    }

    async fn list_notifications(&self) -> Result<Vec<Notification>> {
        Ok(Vec::new())
    }

    async fn mark_notifications_read(&self, thread_id: &str) -> Result<()> {
        self.read_acks.lock().unwrap().push(thread_id.to_string());
        failed(&self.fail_mark_read, "mark_notifications_read")
    }
}

pub fn thread(id: &str, title: &str) -> Thread {
    Thread {
        id: id.to_string(),
        title: title.to_string(),
        status: ThreadStatus::Active,
        ..Thread::default()
    }
}

pub fn message(id: &str, thread_id: &str, content: &str) -> Message {
    Message {
        id: id.to_string(),
        thread_id: thread_id.to_string(),
        role: MessageRole::User,
        content: content.to_string(),
        ..Message::default()
    }
}

/// Message with a deterministic timestamp, `seq` seconds into 2024
pub fn message_at(id: &str, thread_id: &str, content: &str, seq: i64) -> Message {
    Message {
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::seconds(seq),
        ..message(id, thread_id, content)
    }
}
