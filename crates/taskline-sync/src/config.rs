use std::time::Duration;

/// Tunables for the sync engine
///
/// The reconnect cap and delay match the backend's expectations: a bounded
/// number of fixed-delay retries, then manual reconnect only.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// REST origin, e.g. `https://app.example.com`
    pub base_url: String,
    /// Duplex endpoint; derived from `base_url` when not set explicitly
    pub ws_url: String,
    pub max_reconnect_attempts: u32,
    pub reconnect_delay: Duration,
    pub heartbeat_interval: Duration,
    /// Characters of a streaming response shown at most; the full buffer is
    /// still retained for the persisted message
    pub max_stream_display_len: usize,
    /// Reveal-cursor advance per `advance_reveal` call
    pub reveal_chars_per_tick: usize,
}

impl SyncConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let ws_url = derive_ws_url(&base_url);
        Self {
            base_url,
            ws_url,
            ..Self::default()
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            ws_url: "ws://localhost:8080/ws".to_string(),
            max_reconnect_attempts: 5,
            reconnect_delay: Duration::from_secs(2),
            heartbeat_interval: Duration::from_secs(30),
            max_stream_display_len: 10_000,
            reveal_chars_per_tick: 24,
        }
    }
}

fn derive_ws_url(base_url: &str) -> String {
    let origin = base_url.trim_end_matches('/');
    let ws_origin = if let Some(rest) = origin.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = origin.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        origin.to_string()
    };
    format!("{}/ws", ws_origin)
}
