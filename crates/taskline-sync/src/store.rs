use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use taskline_types::{
    Attachment, ContextOptimization, Message, MessageRole, Notification, ServerEvent, Thread,
};
use tokio::sync::watch;

use crate::api::{ChatApi, ThreadPatch};
use crate::error::Result;
use crate::views;

/// Everything the store owns, mutated only in short synchronous sections
#[derive(Default)]
pub(crate) struct StoreState {
    pub threads: Vec<Thread>,
    pub current_thread_id: Option<String>,
    /// Per-thread message cache, oldest first
    pub messages: HashMap<String, Vec<Message>>,
    /// Threads whose messages were fetched this session (cache-once policy)
    pub loaded_threads: HashSet<String>,
    pub notifications: Vec<Notification>,
    pub context_optimizations: HashMap<String, ContextOptimization>,
    pub error: Option<String>,
    pub connected: bool,
}

/// Single source of truth for threads, messages and notifications
///
/// Mutations come from three places: REST round-trips initiated here, push
/// events delivered via [`handle_event`](ChatStore::handle_event), and
/// finalized streams handed over through [`add_message`](ChatStore::add_message).
/// All three converge under one discipline: dedup by id, append-or-replace.
///
/// Network awaits never happen while the state lock is held; every cache
/// write is one short critical section, so overlapping calls cannot leave a
/// partially applied mutation visible.
pub struct ChatStore {
    api: Arc<dyn ChatApi>,
    state: RwLock<StoreState>,
    revision: watch::Sender<u64>,
}

impl ChatStore {
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            api,
            state: RwLock::new(StoreState::default()),
            revision,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
    }

    fn record_error(&self, context: &str, error: &crate::SyncError) {
        tracing::warn!(context, %error, "store operation failed");
        self.write().error = Some(error.to_string());
        self.bump();
    }

    /// Receiver that changes whenever any store state changes; renderers can
    /// await it instead of polling
    pub fn watch_revision(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    // --- thread operations -------------------------------------------------

    /// Create a thread, prepend it to the list and select it
    ///
    /// On failure the list is untouched; the error is recorded in state and
    /// returned to the caller.
    pub async fn create_thread(
        &self,
        title: &str,
        initial_message: Option<&str>,
    ) -> Result<Thread> {
        match self.api.create_thread(title, initial_message).await {
            Ok(thread) => {
                {
                    let mut state = self.write();
                    state.threads.insert(0, thread.clone());
                    state.current_thread_id = Some(thread.id.clone());
                    if initial_message.is_none() {
                        // Nothing on the server yet, so the empty history is
                        // already complete and a fetch can be skipped.
                        state.loaded_threads.insert(thread.id.clone());
                        state.messages.entry(thread.id.clone()).or_default();
                    }
                    state.error = None;
                }
                self.bump();
                tracing::info!(thread_id = %thread.id, "thread created");
                Ok(thread)
            }
            Err(e) => {
                self.record_error("create_thread", &e);
                Err(e)
            }
        }
    }

    /// Replace the thread list wholesale with the server's current list
    ///
    /// On failure the already-loaded list is kept (stale beats empty).
    pub async fn fetch_threads(&self) -> Result<()> {
        match self.api.list_threads().await {
            Ok(threads) => {
                {
                    let mut state = self.write();
                    state.threads = threads;
                    state.error = None;
                }
                self.bump();
                Ok(())
            }
            Err(e) => {
                self.record_error("fetch_threads", &e);
                Err(e)
            }
        }
    }

    /// Select a thread: point at it, optimistically zero its unread count,
    /// best-effort acknowledge reads, and fetch messages once per session
    pub async fn select_thread(&self, thread_id: &str) {
        let already_loaded = {
            let mut state = self.write();
            state.current_thread_id = Some(thread_id.to_string());
            if let Some(thread) = state.threads.iter_mut().find(|t| t.id == thread_id) {
                thread.unread_count = 0;
            }
            state.loaded_threads.contains(thread_id)
        };
        self.bump();

        // Read acknowledgment is best-effort; the local zeroing stands either way
        if let Err(e) = self.api.mark_notifications_read(thread_id).await {
            tracing::warn!(thread_id, error = %e, "read acknowledgment failed");
        }

        if !already_loaded {
            // Failure is recorded in state by fetch_messages
            let _ = self.fetch_messages(thread_id, None).await;
        }
    }

    pub async fn update_thread(&self, thread_id: &str, patch: &ThreadPatch) -> Result<Thread> {
        match self.api.update_thread(thread_id, patch).await {
            Ok(updated) => {
                {
                    let mut state = self.write();
                    if let Some(slot) = state.threads.iter_mut().find(|t| t.id == thread_id) {
                        *slot = updated.clone();
                    }
                    state.error = None;
                }
                self.bump();
                Ok(updated)
            }
            Err(e) => {
                self.record_error("update_thread", &e);
                Err(e)
            }
        }
    }

    /// Delete a thread server-side, then drop it locally
    ///
    /// Deleting the currently selected thread clears the selection.
    pub async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        match self.api.delete_thread(thread_id).await {
            Ok(()) => {
                self.remove_thread_locally(thread_id);
                tracing::info!(thread_id, "thread deleted");
                Ok(())
            }
            Err(e) => {
                self.record_error("delete_thread", &e);
                Err(e)
            }
        }
    }

    fn remove_thread_locally(&self, thread_id: &str) {
        {
            let mut state = self.write();
            state.threads.retain(|t| t.id != thread_id);
            state.messages.remove(thread_id);
            state.loaded_threads.remove(thread_id);
            state.context_optimizations.remove(thread_id);
            if state.current_thread_id.as_deref() == Some(thread_id) {
                state.current_thread_id = None;
            }
        }
        self.bump();
    }

    // --- message operations ------------------------------------------------

    /// Fetch a page of messages for a thread
    ///
    /// The server delivers newest-first. Without `before` the cache is
    /// replaced with the page reversed to oldest-first. With `before` the
    /// older page is reversed the same way and prepended ahead of the
    /// existing cache, keeping the combined list chronological.
    pub async fn fetch_messages(&self, thread_id: &str, before: Option<&str>) -> Result<()> {
        match self.api.list_messages(thread_id, before).await {
            Ok(mut page) => {
                page.reverse();
                {
                    let mut state = self.write();
                    if before.is_none() {
                        state.messages.insert(thread_id.to_string(), page);
                    } else {
                        let existing = state.messages.remove(thread_id).unwrap_or_default();
                        let known: HashSet<&str> =
                            existing.iter().map(|m| m.id.as_str()).collect();
                        page.retain(|m| !known.contains(m.id.as_str()));
                        page.extend(existing);
                        state.messages.insert(thread_id.to_string(), page);
                    }
                    state.loaded_threads.insert(thread_id.to_string());
                    state.error = None;
                }
                self.bump();
                Ok(())
            }
            Err(e) => {
                self.record_error("fetch_messages", &e);
                Err(e)
            }
        }
    }

    /// Post a message; on success the server's canonical copy is appended
    ///
    /// No speculative bubble is inserted before the round trip completes.
    pub async fn send_message(
        &self,
        thread_id: &str,
        content: &str,
        attachments: &[Attachment],
    ) -> Result<Message> {
        match self.api.send_message(thread_id, content, attachments).await {
            Ok(message) => {
                {
                    self.write().error = None;
                }
                self.bump();
                self.add_message(thread_id, message.clone());
                Ok(message)
            }
            Err(e) => {
                self.record_error("send_message", &e);
                Err(e)
            }
        }
    }

    /// Idempotent append: skip if the thread already holds this message id
    ///
    /// This is the single merge point for REST responses, push events and
    /// finalized streams; a message arriving through two of those paths
    /// lands exactly once. Returns whether the message was inserted.
    pub fn add_message(&self, thread_id: &str, message: Message) -> bool {
        let inserted = {
            let mut state = self.write();
            let cache = state.messages.entry(thread_id.to_string()).or_default();
            if cache.iter().any(|m| m.id == message.id) {
                false
            } else {
                cache.push(message.clone());
                if message.role == MessageRole::Assistant {
                    if let Some(record) = message.context_optimization() {
                        state
                            .context_optimizations
                            .insert(thread_id.to_string(), record);
                    }
                }
                if let Some(thread) = state.threads.iter_mut().find(|t| t.id == thread_id) {
                    thread.last_message = Some(message.content.clone());
                    thread.updated_at = message.created_at;
                }
                true
            }
        };
        if inserted {
            self.bump();
        }
        inserted
    }

    // --- notifications -----------------------------------------------------

    pub async fn fetch_notifications(&self) -> Result<()> {
        match self.api.list_notifications().await {
            Ok(notifications) => {
                {
                    let mut state = self.write();
                    state.notifications = notifications;
                    state.error = None;
                }
                self.bump();
                Ok(())
            }
            Err(e) => {
                self.record_error("fetch_notifications", &e);
                Err(e)
            }
        }
    }

    // --- push events -------------------------------------------------------

    /// Apply one pushed event; every arm is idempotent under redelivery
    pub fn handle_event(&self, event: &ServerEvent) {
        match event {
            ServerEvent::ThreadCreated { thread } => {
                let mut state = self.write();
                if !state.threads.iter().any(|t| t.id == thread.id) {
                    state.threads.insert(0, thread.clone());
                }
                drop(state);
                self.bump();
            }
            ServerEvent::ThreadUpdated { thread } => {
                let mut state = self.write();
                if let Some(slot) = state.threads.iter_mut().find(|t| t.id == thread.id) {
                    *slot = thread.clone();
                } else {
                    state.threads.insert(0, thread.clone());
                }
                drop(state);
                self.bump();
            }
            ServerEvent::ThreadDeleted { thread_id } => {
                self.remove_thread_locally(thread_id);
            }
            ServerEvent::MessageSent { message } => {
                let thread_id = message.thread_id.clone();
                let inserted = self.add_message(&thread_id, message.clone());
                if inserted {
                    let mut state = self.write();
                    let is_current = state.current_thread_id.as_deref() == Some(&*thread_id);
                    if !is_current {
                        if let Some(thread) =
                            state.threads.iter_mut().find(|t| t.id == thread_id)
                        {
                            thread.unread_count += 1;
                        }
                    }
                    drop(state);
                    self.bump();
                }
            }
            ServerEvent::NotificationsRead { thread_id } => {
                let mut state = self.write();
                if let Some(thread) = state.threads.iter_mut().find(|t| &t.id == thread_id) {
                    thread.unread_count = 0;
                }
                for notification in state
                    .notifications
                    .iter_mut()
                    .filter(|n| &n.thread_id == thread_id)
                {
                    notification.read = true;
                }
                drop(state);
                self.bump();
            }
        }
    }

    // --- trivial setters ---------------------------------------------------

    pub fn clear_error(&self) {
        self.write().error = None;
        self.bump();
    }

    pub fn set_connected(&self, connected: bool) {
        self.write().connected = connected;
        self.bump();
    }

    // --- derived reads (compute on read, never cached) ----------------------

    pub fn threads(&self) -> Vec<Thread> {
        self.read().threads.clone()
    }

    pub fn current_thread_id(&self) -> Option<String> {
        self.read().current_thread_id.clone()
    }

    pub fn current_thread(&self) -> Option<Thread> {
        let state = self.read();
        views::current_thread(&state.threads, state.current_thread_id.as_deref()).cloned()
    }

    /// Messages of the selected thread, oldest first; empty if none selected
    /// or not yet fetched
    pub fn current_messages(&self) -> Vec<Message> {
        let state = self.read();
        match state.current_thread_id.as_deref() {
            Some(id) => views::messages_for(&state.messages, id).to_vec(),
            None => Vec::new(),
        }
    }

    pub fn messages_for(&self, thread_id: &str) -> Vec<Message> {
        views::messages_for(&self.read().messages, thread_id).to_vec()
    }

    pub fn active_threads(&self) -> Vec<Thread> {
        views::active_threads(&self.read().threads)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn total_unread_count(&self) -> u64 {
        views::total_unread_count(&self.read().threads)
    }

    pub fn context_optimization(&self, thread_id: &str) -> Option<ContextOptimization> {
        self.read().context_optimizations.get(thread_id).copied()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.read().notifications.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.read().connected
    }
}
