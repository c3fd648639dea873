//! # Taskline - real-time chat synchronization for Rust clients
//!
//! Taskline keeps a local view of chat threads and messages consistent with
//! a server that pushes updates over a persistent connection, while the
//! caller performs optimistic mutations over REST and consumes
//! token-streamed assistant responses:
//!
//! - **Chat state store**: one authoritative in-memory model, dedup by id,
//!   append-or-replace merge from REST, push events and streams
//! - **Connection manager**: heartbeat, disconnect detection, bounded
//!   fixed-delay reconnection
//! - **Stream assembler**: delta/replace accumulation with a typewriter
//!   reveal, cancellable end to end
//! - **Event dispatcher**: typed push events fanned out to handlers
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use taskline::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = SyncEngine::builder()
//!         .base_url("https://app.example.com")
//!         .build()?;
//!     engine.init();
//!
//!     let thread = engine.store().create_thread("Bug Report", None).await?;
//!     engine.store().send_message(&thread.id, "hello", &[]).await?;
//!
//!     engine.dispose();
//!     Ok(())
//! }
//! ```

pub use taskline_sync::{
    ChatApi, ChatStore, ConnectionManager, ConnectionStatus, EventDispatcher, HttpChatApi,
    StreamAssembler, StreamPhase, Subscription, SyncConfig, SyncEngine, SyncEngineBuilder,
    SyncError, ThreadPatch,
};
pub use taskline_types::{
    Attachment, ClientFrame, ContextOptimization, EventFrame, Message, MessageRole, MessageType,
    Notification, ServerEvent, StreamChunk, Thread, ThreadStatus,
};

/// Everything most applications need
pub mod prelude {
    pub use taskline_sync::{
        ChatStore, StreamPhase, SyncConfig, SyncEngine, SyncEngineBuilder, SyncError,
    };
    pub use taskline_types::{
        Attachment, Message, MessageRole, MessageType, ServerEvent, StreamChunk, Thread,
        ThreadStatus,
    };
}
