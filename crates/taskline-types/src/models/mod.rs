mod message;
mod notification;
mod thread;

pub use message::{Attachment, Message, MessageRole, MessageType};
pub use notification::Notification;
pub use thread::{ContextOptimization, Thread, ThreadStatus};
