use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::{SinkExt, StreamExt};
use taskline_types::{ClientFrame, EventFrame, ServerEvent};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::config::SyncConfig;
use crate::dispatcher::EventDispatcher;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Diagnostics snapshot of the duplex connection
#[derive(Debug, Clone)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub reconnect_attempts: u32,
    /// Most recent decoded inbound event
    pub last_event: Option<ServerEvent>,
}

#[derive(Default)]
struct ConnState {
    connected: bool,
    reconnect_attempts: u32,
    last_event: Option<ServerEvent>,
}

type ConnectivityHook = Box<dyn Fn(bool) + Send + Sync>;

/// Owns the persistent duplex connection to the server
///
/// Handles connect, heartbeat, disconnect detection and bounded fixed-delay
/// reconnection. Inbound text frames are decoded once and fanned out through
/// the [`EventDispatcher`]; a frame that fails to decode is logged and
/// skipped, never fatal. Outbound frames are transmitted only while
/// connected; callers must not depend on guaranteed delivery.
pub struct ConnectionManager {
    inner: Arc<ConnectionInner>,
}

struct ConnectionInner {
    config: SyncConfig,
    dispatcher: Arc<EventDispatcher>,
    on_connectivity: ConnectivityHook,
    state: Mutex<ConnState>,
    outbound: Mutex<Option<mpsc::UnboundedSender<ClientFrame>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionManager {
    pub fn new(
        config: SyncConfig,
        dispatcher: Arc<EventDispatcher>,
        on_connectivity: impl Fn(bool) + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(ConnectionInner {
                config,
                dispatcher,
                on_connectivity: Box::new(on_connectivity),
                state: Mutex::new(ConnState::default()),
                outbound: Mutex::new(None),
                task: Mutex::new(None),
            }),
        }
    }

    /// Open the connection; no-op while a connect/reconnect cycle is running
    pub fn connect(&self) {
        let mut task = lock(&self.inner.task);
        if let Some(handle) = task.as_ref() {
            if !handle.is_finished() {
                tracing::debug!("connect ignored, already connecting or connected");
                return;
            }
        }
        let inner = self.inner.clone();
        *task = Some(tokio::spawn(async move { inner.run().await }));
    }

    /// Close the connection and cancel any pending reconnect
    ///
    /// Resets state to initial values; safe to call repeatedly.
    pub fn disconnect(&self) {
        if let Some(handle) = lock(&self.inner.task).take() {
            handle.abort();
        }
        *lock(&self.inner.outbound) = None;
        let was_connected = {
            let mut state = lock(&self.inner.state);
            let was = state.connected;
            *state = ConnState::default();
            was
        };
        if was_connected {
            (self.inner.on_connectivity)(false);
            tracing::info!("disconnected");
        }
    }

    /// Transmit a frame if connected; otherwise log and drop
    pub fn send(&self, frame: ClientFrame) {
        if !lock(&self.inner.state).connected {
            tracing::warn!("not connected, dropping outbound frame");
            return;
        }
        let outbound = lock(&self.inner.outbound);
        match outbound.as_ref() {
            Some(tx) => {
                if tx.send(frame).is_err() {
                    tracing::warn!("writer gone, dropping outbound frame");
                }
            }
            None => tracing::warn!("no writer, dropping outbound frame"),
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        let state = lock(&self.inner.state);
        ConnectionStatus {
            connected: state.connected,
            reconnect_attempts: state.reconnect_attempts,
            last_event: state.last_event.clone(),
        }
    }
}

impl ConnectionInner {
    /// Connect/reconnect cycle: fixed delay between attempts, bounded count,
    /// counter reset on every successful connect
    async fn run(self: Arc<Self>) {
        loop {
            match connect_async(self.config.ws_url.as_str()).await {
                Ok((ws, _)) => {
                    {
                        let mut state = lock(&self.state);
                        state.connected = true;
                        state.reconnect_attempts = 0;
                    }
                    (self.on_connectivity)(true);
                    tracing::info!(url = %self.config.ws_url, "connected");

                    self.drive(ws).await;

                    lock(&self.state).connected = false;
                    *lock(&self.outbound) = None;
                    (self.on_connectivity)(false);
                    tracing::warn!("connection closed");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "connect failed");
                }
            }

            let attempts = lock(&self.state).reconnect_attempts;
            if attempts >= self.config.max_reconnect_attempts {
                tracing::warn!(
                    attempts,
                    "reconnect attempts exhausted, manual connect required"
                );
                return;
            }
            lock(&self.state).reconnect_attempts = attempts + 1;
            tokio::time::sleep(self.config.reconnect_delay).await;
        }
    }

    /// Pump one live connection until it closes or errors
    async fn drive(&self, ws: WsStream) {
        let (mut sink, mut stream) = ws.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<ClientFrame>();
        *lock(&self.outbound) = Some(tx);

        let mut heartbeat = tokio::time::interval(self.config.heartbeat_interval);
        // First tick of a tokio interval resolves immediately
        heartbeat.tick().await;

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    if sink.send(WsMessage::Ping(Vec::new())).await.is_err() {
                        break;
                    }
                }
                frame = rx.recv() => {
                    match frame {
                        Some(frame) => match serde_json::to_string(&frame) {
                            Ok(json) => {
                                if sink.send(WsMessage::Text(json)).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "failed to encode outbound frame");
                            }
                        },
                        None => break,
                    }
                }
                inbound = stream.next() => {
                    match inbound {
                        Some(Ok(WsMessage::Text(text))) => self.handle_text(&text),
                        Some(Ok(WsMessage::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "websocket error");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Decode one inbound frame and fan it out; bad frames never kill the loop
    fn handle_text(&self, text: &str) {
        match serde_json::from_str::<EventFrame>(text) {
            Ok(frame) => {
                tracing::debug!(timestamp = frame.timestamp, "event frame received");
                lock(&self.state).last_event = Some(frame.event.clone());
                self.dispatcher.dispatch(&frame.event);
            }
            Err(e) => {
                tracing::warn!(error = %e, "undecodable frame skipped");
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
