pub mod events;
pub mod models;

pub use events::{ClientFrame, EventFrame, ServerEvent, StreamChunk};
pub use models::{
    Attachment, ContextOptimization, Message, MessageRole, MessageType, Notification, Thread,
    ThreadStatus,
};
