use std::sync::Arc;

use futures::future::{AbortHandle, AbortRegistration};
use taskline_types::{Message, MessageRole, StreamChunk};

use crate::config::SyncConfig;
use crate::store::ChatStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    Idle,
    Streaming,
}

/// Accumulates an incrementally delivered assistant response for one thread
///
/// Ingestion and display are decoupled: chunks land in the accumulated
/// buffer immediately, while a reveal cursor advances toward the buffer end
/// at the configured rate (typewriter effect). Chunk order is the
/// transport's responsibility; deltas are applied as received.
///
/// At most one stream is active per assembler. `start` while streaming
/// cancels the previous stream first.
pub struct StreamAssembler {
    thread_id: String,
    store: Arc<ChatStore>,
    max_display_chars: usize,
    reveal_chars_per_tick: usize,
    phase: StreamPhase,
    placeholder_id: Option<String>,
    accumulated: String,
    /// Length of `accumulated` in chars, kept in sync on every write
    char_len: usize,
    reveal_cursor: usize,
    abort: Option<AbortHandle>,
}

impl StreamAssembler {
    pub fn new(thread_id: impl Into<String>, store: Arc<ChatStore>, config: &SyncConfig) -> Self {
        Self {
            thread_id: thread_id.into(),
            store,
            max_display_chars: config.max_stream_display_len,
            reveal_chars_per_tick: config.reveal_chars_per_tick,
            phase: StreamPhase::Idle,
            placeholder_id: None,
            accumulated: String::new(),
            char_len: 0,
            reveal_cursor: 0,
            abort: None,
        }
    }

    /// Begin a new stream, cancelling any active one
    ///
    /// Returns the abort registration for the transport to wrap its request
    /// future in, so `cancel` reaches the in-flight request.
    pub fn start(&mut self) -> AbortRegistration {
        if self.phase == StreamPhase::Streaming {
            tracing::debug!(thread_id = %self.thread_id, "new stream supersedes active one");
            self.cancel();
        }
        let (handle, registration) = AbortHandle::new_pair();
        self.abort = Some(handle);
        self.placeholder_id = Some(uuid::Uuid::new_v4().to_string());
        self.accumulated.clear();
        self.char_len = 0;
        self.reveal_cursor = 0;
        self.phase = StreamPhase::Streaming;
        registration
    }

    /// Apply one chunk: delta appends, full content replaces
    ///
    /// Ignored outside the Streaming phase (late chunks after cancel).
    pub fn ingest(&mut self, chunk: &StreamChunk) {
        if self.phase != StreamPhase::Streaming {
            return;
        }
        if let Some(delta) = chunk.delta.as_deref() {
            self.accumulated.push_str(delta);
            self.char_len += delta.chars().count();
        } else if let Some(content) = chunk.content.as_deref() {
            self.accumulated = content.to_string();
            self.char_len = content.chars().count();
            // Corrective resync may shrink the buffer
            self.reveal_cursor = self.reveal_cursor.min(self.char_len);
        }
    }

    /// Advance the reveal cursor one tick toward the buffer end
    pub fn advance_reveal(&mut self) {
        self.reveal_cursor = (self.reveal_cursor + self.reveal_chars_per_tick).min(self.char_len);
    }

    /// Fast-forward the reveal cursor to the buffer end
    pub fn skip_to_end(&mut self) {
        self.reveal_cursor = self.char_len;
    }

    pub fn reveal_complete(&self) -> bool {
        self.reveal_cursor >= self.char_len
    }

    /// Text currently shown: revealed prefix, capped at the display limit
    ///
    /// Content beyond the cap is retained in the buffer and still reaches
    /// the finalized message.
    pub fn visible_content(&self) -> String {
        let shown = self.reveal_cursor.min(self.max_display_chars);
        self.accumulated.chars().take(shown).collect()
    }

    /// Message-shaped view of the in-progress response, for rendering
    pub fn placeholder(&self) -> Option<Message> {
        let id = self.placeholder_id.as_ref()?;
        Some(Message {
            id: id.clone(),
            thread_id: self.thread_id.clone(),
            role: MessageRole::Assistant,
            content: self.visible_content(),
            ..Message::default()
        })
    }

    /// Abort the in-flight request and discard the partial buffer
    ///
    /// Nothing reaches the store; the placeholder disappears.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.abort.take() {
            handle.abort();
        }
        if self.phase == StreamPhase::Streaming {
            tracing::debug!(thread_id = %self.thread_id, "stream cancelled");
        }
        self.reset();
    }

    /// Natural completion: hand the finalized message to the store
    ///
    /// The server's canonical content wins; if it is empty the accumulated
    /// buffer stands in. Dedup in the store applies as usual. Returns to
    /// Idle either way.
    pub fn complete(&mut self, mut final_message: Message) -> bool {
        if self.phase != StreamPhase::Streaming {
            return false;
        }
        if final_message.content.is_empty() {
            final_message.content = std::mem::take(&mut self.accumulated);
        }
        let inserted = self.store.add_message(&self.thread_id, final_message);
        self.abort = None;
        self.reset();
        inserted
    }

    fn reset(&mut self) {
        self.phase = StreamPhase::Idle;
        self.placeholder_id = None;
        self.accumulated.clear();
        self.char_len = 0;
        self.reveal_cursor = 0;
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    pub fn is_streaming(&self) -> bool {
        self.phase == StreamPhase::Streaming
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }
}
