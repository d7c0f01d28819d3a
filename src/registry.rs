//! Task registration and execution.
//!
//! Tasks are registered once at startup and immutable afterwards: a name, a
//! cron schedule, and an async handler. The `TaskExecutor` is pure callback
//! dispatch; resolving an unregistered name is a configuration bug and fails
//! the calling tick, never the process.

use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use crate::{Error, Result};

/// Async handler invoked when a task fires.
pub type TaskHandler = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// A named task with its schedule and handler.
#[derive(Clone)]
pub struct TaskDefinition {
    pub name: String,
    /// Cron expression with a seconds column, e.g. `"0 */5 * * * *"`.
    pub schedule: String,
    handler: TaskHandler,
}

impl TaskDefinition {
    pub fn handler(&self) -> TaskHandler {
        Arc::clone(&self.handler)
    }
}

impl std::fmt::Debug for TaskDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskDefinition")
            .field("name", &self.name)
            .field("schedule", &self.schedule)
            .finish_non_exhaustive()
    }
}

/// Immutable mapping from task name to definition.
#[derive(Default, Clone)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, TaskDefinition>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task. A later registration under the same name replaces
    /// the earlier one.
    pub fn register<F, Fut>(&mut self, name: &str, schedule: &str, handler: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: TaskHandler = Arc::new(move || Box::pin(handler()));
        self.tasks.insert(
            name.to_string(),
            TaskDefinition {
                name: name.to_string(),
                schedule: schedule.to_string(),
                handler,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&TaskDefinition> {
        self.tasks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &TaskDefinition> {
        self.tasks.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Resolves task names to handlers and runs them.
#[derive(Clone)]
pub struct TaskExecutor {
    registry: Arc<TaskRegistry>,
}

impl TaskExecutor {
    pub fn new(registry: Arc<TaskRegistry>) -> Self {
        Self { registry }
    }

    /// Invoke the handler registered under `name`.
    pub async fn execute(&self, name: &str) -> Result<()> {
        let handler = self
            .registry
            .get(name)
            .map(TaskDefinition::handler)
            .ok_or_else(|| Error::UnknownTask(name.to_string()))?;
        handler().await;
        Ok(())
    }
}
