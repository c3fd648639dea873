//! Pure derived views over store state
//!
//! No independent state and no caching: each function recomputes from its
//! inputs so readers never observe a stale intermediate value.

use std::collections::HashMap;

use taskline_types::{Message, Thread, ThreadStatus};

pub fn current_thread<'a>(threads: &'a [Thread], current_id: Option<&str>) -> Option<&'a Thread> {
    let id = current_id?;
    threads.iter().find(|t| t.id == id)
}

pub fn messages_for<'a>(cache: &'a HashMap<String, Vec<Message>>, thread_id: &str) -> &'a [Message] {
    cache.get(thread_id).map(Vec::as_slice).unwrap_or(&[])
}

pub fn active_threads(threads: &[Thread]) -> Vec<&Thread> {
    threads
        .iter()
        .filter(|t| t.status == ThreadStatus::Active)
        .collect()
}

pub fn total_unread_count(threads: &[Thread]) -> u64 {
    threads.iter().map(|t| u64::from(t.unread_count)).sum()
}
