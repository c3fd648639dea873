use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::AbortRegistration;
use taskline_types::{ClientFrame, Message, StreamChunk};

use crate::api::{ChatApi, HttpChatApi};
use crate::assembler::StreamAssembler;
use crate::config::SyncConfig;
use crate::connection::{ConnectionManager, ConnectionStatus};
use crate::dispatcher::{EventDispatcher, Subscription};
use crate::error::{Result, SyncError};
use crate::store::ChatStore;

/// The session context object wiring store, connection, dispatcher and
/// per-thread stream assemblers together
///
/// Constructed once at application start via [`SyncEngine::builder`] and
/// passed by reference to whoever needs it; `init` and `dispose` bracket the
/// lifecycle explicitly. There is no process-wide singleton.
pub struct SyncEngine {
    config: SyncConfig,
    store: Arc<ChatStore>,
    dispatcher: Arc<EventDispatcher>,
    connection: ConnectionManager,
    streams: Mutex<HashMap<String, StreamAssembler>>,
    subscription: Mutex<Option<Subscription>>,
}

impl SyncEngine {
    pub fn builder() -> SyncEngineBuilder {
        SyncEngineBuilder::new()
    }

    /// Wire the store into the dispatcher and open the connection
    ///
    /// Must run inside a tokio runtime; the connection task is spawned here.
    pub fn init(&self) {
        let store = self.store.clone();
        let subscription = self.dispatcher.subscribe(move |event| {
            store.handle_event(event);
            Ok(())
        });
        *lock(&self.subscription) = Some(subscription);
        self.connection.connect();
        tracing::info!("sync engine initialized");
    }

    /// Tear everything down: cancel streams, unhook the store, disconnect
    pub fn dispose(&self) {
        for assembler in lock(&self.streams).values_mut() {
            assembler.cancel();
        }
        if let Some(subscription) = lock(&self.subscription).take() {
            subscription.unsubscribe();
        }
        self.connection.disconnect();
        tracing::info!("sync engine disposed");
    }

    pub fn store(&self) -> &Arc<ChatStore> {
        &self.store
    }

    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.dispatcher
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Select a thread, cancelling any stream running in the one switched
    /// away from, and subscribe to pushes for the new one
    pub async fn select_thread(&self, thread_id: &str) {
        if let Some(previous) = self.store.current_thread_id() {
            if previous != thread_id {
                self.cancel_stream(&previous);
            }
        }
        self.store.select_thread(thread_id).await;
        self.connection.send(ClientFrame::Subscribe {
            thread_id: thread_id.to_string(),
        });
    }

    /// Delete a thread, cancelling its stream first
    pub async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        self.cancel_stream(thread_id);
        lock(&self.streams).remove(thread_id);
        self.store.delete_thread(thread_id).await
    }

    // --- streaming ----------------------------------------------------------

    /// Begin an assistant response stream for a thread
    ///
    /// Starting while a stream is active for that thread cancels the old one
    /// first; afterwards exactly one stream is running. The returned
    /// registration is for the transport to wrap its request future in.
    pub fn start_stream(&self, thread_id: &str) -> AbortRegistration {
        let mut streams = lock(&self.streams);
        let assembler = streams.entry(thread_id.to_string()).or_insert_with(|| {
            StreamAssembler::new(thread_id, self.store.clone(), &self.config)
        });
        assembler.start()
    }

    pub fn ingest_chunk(&self, thread_id: &str, chunk: &StreamChunk) {
        if let Some(assembler) = lock(&self.streams).get_mut(thread_id) {
            assembler.ingest(chunk);
        }
    }

    pub fn advance_reveal(&self, thread_id: &str) {
        if let Some(assembler) = lock(&self.streams).get_mut(thread_id) {
            assembler.advance_reveal();
        }
    }

    pub fn skip_to_end(&self, thread_id: &str) {
        if let Some(assembler) = lock(&self.streams).get_mut(thread_id) {
            assembler.skip_to_end();
        }
    }

    /// Message-shaped view of the in-progress response, if one is streaming
    pub fn streaming_placeholder(&self, thread_id: &str) -> Option<Message> {
        lock(&self.streams)
            .get(thread_id)
            .filter(|a| a.is_streaming())
            .and_then(|a| a.placeholder())
    }

    pub fn is_streaming(&self, thread_id: &str) -> bool {
        lock(&self.streams)
            .get(thread_id)
            .map(StreamAssembler::is_streaming)
            .unwrap_or(false)
    }

    pub fn cancel_stream(&self, thread_id: &str) {
        if let Some(assembler) = lock(&self.streams).get_mut(thread_id) {
            assembler.cancel();
        }
    }

    /// Finalize a stream with the server's canonical message
    pub fn complete_stream(&self, thread_id: &str, final_message: Message) -> bool {
        match lock(&self.streams).get_mut(thread_id) {
            Some(assembler) => assembler.complete(final_message),
            None => false,
        }
    }
}

/// Builder mirroring the crate's client construction style
pub struct SyncEngineBuilder {
    config: Option<SyncConfig>,
    base_url: Option<String>,
    api: Option<Arc<dyn ChatApi>>,
}

impl SyncEngineBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            base_url: None,
            api: None,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Substitute the REST surface; used by tests and embedders
    pub fn api(mut self, api: Arc<dyn ChatApi>) -> Self {
        self.api = Some(api);
        self
    }

    pub fn build(self) -> Result<SyncEngine> {
        let config = match (self.config, self.base_url) {
            (Some(config), _) => config,
            (None, Some(url)) => SyncConfig::new(url),
            (None, None) => {
                return Err(SyncError::Internal(
                    "base_url or config is required".to_string(),
                ))
            }
        };
        let api = self
            .api
            .unwrap_or_else(|| Arc::new(HttpChatApi::new(&config.base_url)));
        let store = Arc::new(ChatStore::new(api));
        let dispatcher = Arc::new(EventDispatcher::new());

        let hook_store = store.clone();
        let connection = ConnectionManager::new(config.clone(), dispatcher.clone(), move |up| {
            hook_store.set_connected(up)
        });

        Ok(SyncEngine {
            config,
            store,
            dispatcher,
            connection,
            streams: Mutex::new(HashMap::new()),
            subscription: Mutex::new(None),
        })
    }
}

impl Default for SyncEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
