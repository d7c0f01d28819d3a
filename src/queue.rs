//! Shared task queue contract.
//!
//! Delivery is at-least-once with best-effort FIFO; the consumer compensates
//! for redelivery and slow drains with the expiry timestamp baked into each
//! message, not with transport-level guarantees. A transport that is not yet
//! ready (e.g. still connecting) must answer `is_ready() == false`; callers
//! skip the tick entirely rather than push or pop against it.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::Result;

#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Whether the named queue can accept pushes and pops right now.
    async fn is_ready(&self, queue: &str) -> bool;

    async fn push(&self, queue: &str, message: &str) -> Result<()>;

    /// Pop the oldest message, or `None` when the queue is empty.
    async fn pop(&self, queue: &str) -> Result<Option<String>>;
}

/// In-memory FIFO `QueueTransport`.
///
/// Readiness is a toggle so tests can exercise the warm-up path where the
/// transport exists but is not yet connected.
#[derive(Clone)]
pub struct MemoryQueue {
    queues: Arc<Mutex<HashMap<String, VecDeque<String>>>>,
    ready: Arc<AtomicBool>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self {
            queues: Arc::new(Mutex::new(HashMap::new())),
            ready: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Number of messages currently queued under `queue`.
    pub async fn len(&self, queue: &str) -> usize {
        let queues = self.queues.lock().await;
        queues.get(queue).map(|q| q.len()).unwrap_or(0)
    }

    pub async fn is_empty(&self, queue: &str) -> bool {
        self.len(queue).await == 0
    }
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueTransport for MemoryQueue {
    async fn is_ready(&self, _queue: &str) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn push(&self, queue: &str, message: &str) -> Result<()> {
        let mut queues = self.queues.lock().await;
        queues
            .entry(queue.to_string())
            .or_default()
            .push_back(message.to_string());
        Ok(())
    }

    async fn pop(&self, queue: &str) -> Result<Option<String>> {
        let mut queues = self.queues.lock().await;
        Ok(queues.get_mut(queue).and_then(|q| q.pop_front()))
    }
}
