//! Per-tick dispatch decision.
//!
//! When a task's own schedule fires, the dispatcher picks the execution
//! path: run locally (queueing disabled, single-instance deployments), or
//! enqueue a deferred request that any worker's consumer may pick up. With
//! queueing enabled only the current leader produces work, so each tick
//! yields at most one queued message fleet-wide.

use chrono::Utc;
use std::sync::Arc;

use crate::election::LeadershipHandle;
use crate::message::TaskMessage;
use crate::queue::QueueTransport;
use crate::registry::TaskExecutor;
use crate::{fclog, fclog_error};

/// How dispatched ticks reach an executor.
#[derive(Clone)]
pub enum DispatchMode {
    /// Execute synchronously on every process.
    Direct,
    /// Leader-gated push onto the shared queue.
    Queued {
        queue: Arc<dyn QueueTransport>,
        leadership: LeadershipHandle,
        queue_name: String,
        /// Lifetime granted to each queued message.
        message_ttl: chrono::Duration,
    },
}

#[derive(Clone)]
pub struct TaskDispatcher {
    executor: TaskExecutor,
    mode: DispatchMode,
}

impl TaskDispatcher {
    pub fn new(executor: TaskExecutor, mode: DispatchMode) -> Self {
        Self { executor, mode }
    }

    /// Handle one schedule tick for `task`.
    ///
    /// Queued mode never falls back to direct execution: a non-leader tick
    /// and an unready-transport tick are both dropped, so a message can
    /// only ever originate from the leader through a ready transport.
    pub async fn dispatch(&self, task: &str) {
        match &self.mode {
            DispatchMode::Direct => {
                if let Err(e) = self.executor.execute(task).await {
                    fclog_error!("Task `{}` failed: {}", task, e);
                }
            }
            DispatchMode::Queued {
                queue,
                leadership,
                queue_name,
                message_ttl,
            } => {
                if !leadership.is_leader() {
                    return;
                }
                if !queue.is_ready(queue_name).await {
                    return;
                }
                let message = TaskMessage::new(task, Utc::now() + *message_ttl);
                match queue.push(queue_name, &message.encode()).await {
                    Ok(()) => fclog!("Task: {} pushed to queue", task),
                    Err(e) => fclog_error!("Task `{}` push failed: {}", task, e),
                }
            }
        }
    }
}
