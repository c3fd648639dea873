pub mod api;
pub mod assembler;
pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod store;
pub mod views;

pub use api::{ChatApi, HttpChatApi, ThreadPatch};
pub use assembler::{StreamAssembler, StreamPhase};
pub use config::SyncConfig;
pub use connection::{ConnectionManager, ConnectionStatus};
pub use dispatcher::{EventDispatcher, Subscription};
pub use engine::{SyncEngine, SyncEngineBuilder};
pub use error::{Result, SyncError};
pub use store::ChatStore;
