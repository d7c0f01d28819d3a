//! Queue drain loop.
//!
//! One valid message is executed per tick. Expired or malformed messages
//! are discarded with an immediate retry pop, so a backlog of stale work
//! (say, after a consumer outage) clears quickly without unbounded per-tick
//! execution. Consumption is deliberately not leader-gated: any worker may
//! pop, spreading load and surviving a leader crash.

use chrono::Utc;
use std::sync::Arc;

use crate::message::TaskMessage;
use crate::queue::QueueTransport;
use crate::registry::TaskExecutor;
use crate::{fclog_debug, fclog_error};

#[derive(Clone)]
pub struct QueueConsumer {
    executor: TaskExecutor,
    queue: Arc<dyn QueueTransport>,
    queue_name: String,
}

impl QueueConsumer {
    pub fn new(executor: TaskExecutor, queue: Arc<dyn QueueTransport>, queue_name: &str) -> Self {
        Self {
            executor,
            queue,
            queue_name: queue_name.to_string(),
        }
    }

    /// One consumption round.
    ///
    /// Pops until a valid message executes or the queue reports empty.
    /// All failures end the tick without propagating.
    pub async fn consume_tick(&self) {
        if !self.queue.is_ready(&self.queue_name).await {
            return;
        }

        loop {
            let popped = match self.queue.pop(&self.queue_name).await {
                Ok(popped) => popped,
                Err(e) => {
                    fclog_error!("Consume tick: pop failed: {}", e);
                    return;
                }
            };
            let Some(raw) = popped else {
                return;
            };

            let message = match TaskMessage::decode(&raw) {
                Ok(message) => message,
                Err(e) => {
                    fclog_error!("Consume tick: discarding malformed message: {}", e);
                    continue;
                }
            };

            if message.is_expired(Utc::now()) {
                fclog_debug!("Task: `{}` canceled", message.task);
                continue;
            }

            if let Err(e) = self.executor.execute(&message.task).await {
                fclog_error!("Task `{}` failed: {}", message.task, e);
            }
            return;
        }
    }
}
