//! Minimal end-to-end run against a live backend:
//! connect, create a thread, send a message, watch pushes arrive.
//!
//! Set TASKLINE_BASE_URL (defaults to http://localhost:8080) and run with
//! RUST_LOG=taskline_sync=debug for frame-level logs.

use std::time::Duration;

use taskline_sync::SyncEngine;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_url =
        std::env::var("TASKLINE_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
    tracing::info!(%base_url, "starting taskline example");

    let engine = SyncEngine::builder().base_url(&base_url).build()?;
    engine.init();

    engine.store().fetch_threads().await?;
    tracing::info!(count = engine.store().threads().len(), "threads loaded");

    let thread = engine
        .store()
        .create_thread("Sprint planning", Some("Let's break down the next sprint"))
        .await?;
    tracing::info!(thread_id = %thread.id, "thread created and selected");

    engine
        .store()
        .send_message(&thread.id, "What are the open tasks?", &[])
        .await?;

    // Give pushed events a moment to arrive, then show what we have
    tokio::time::sleep(Duration::from_secs(2)).await;
    for message in engine.store().current_messages() {
        println!("[{:?}] {}", message.role, message.content);
    }
    println!(
        "unread across threads: {}",
        engine.store().total_unread_count()
    );

    engine.dispose();
    Ok(())
}
