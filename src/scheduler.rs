//! Scheduler assembly.
//!
//! Wires configuration, the task registry, and the shared-store/queue
//! collaborators into one set of timer loops:
//!
//! - one election timer (leadership claim/confirm),
//! - one consumer timer (queue drain),
//! - one timer per registered task (dispatch).
//!
//! With queueing disabled none of the coordination machinery is built and
//! every process simply runs its full schedule locally.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::SchedulerConfig;
use crate::consumer::QueueConsumer;
use crate::dispatch::{DispatchMode, TaskDispatcher};
use crate::election::{ElectionManager, LeadershipHandle};
use crate::identity::WorkerId;
use crate::queue::QueueTransport;
use crate::registry::{TaskDefinition, TaskExecutor, TaskRegistry};
use crate::store::KeyValueStore;
use crate::timer::{parse_schedule, run_cron_loop};
use crate::{fclog, Error, Result};

/// Coordinated cron scheduler for one worker process.
pub struct Scheduler {
    config: SchedulerConfig,
    registry: Arc<TaskRegistry>,
    dispatcher: TaskDispatcher,
    election: Option<Arc<ElectionManager>>,
    consumer: Option<Arc<QueueConsumer>>,
    worker_id: WorkerId,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.config)
            .field("worker_id", &self.worker_id)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Build a scheduler from configuration and collaborators.
    ///
    /// Fails fast at startup on an invalid configuration, an unparseable
    /// task schedule, a config job override against an unregistered task,
    /// or, when queueing is enabled, a missing store or queue. Running
    /// with a half-configured coordination layer risks silent duplicate
    /// execution, so none of these are recoverable.
    pub fn new(
        config: SchedulerConfig,
        registry: TaskRegistry,
        store: Option<Arc<dyn KeyValueStore>>,
        queue: Option<Arc<dyn QueueTransport>>,
    ) -> Result<Self> {
        config.validate()?;

        for name in config.jobs.keys() {
            if !registry.contains(name) {
                return Err(Error::InvalidConfig(format!(
                    "config overrides schedule of unregistered task `{}`",
                    name
                )));
            }
        }
        for def in registry.definitions() {
            parse_schedule(&def.schedule)?;
        }

        let registry = Arc::new(registry);
        let executor = TaskExecutor::new(Arc::clone(&registry));
        let worker_id = WorkerId::generate();

        if !config.queue.enable {
            return Ok(Self {
                config,
                registry,
                dispatcher: TaskDispatcher::new(executor, DispatchMode::Direct),
                election: None,
                consumer: None,
                worker_id,
            });
        }

        let store = store.ok_or_else(|| {
            Error::MissingDependency("key-value store (required when queueing is enabled)".into())
        })?;
        let queue = queue.ok_or_else(|| {
            Error::MissingDependency("queue transport (required when queueing is enabled)".into())
        })?;

        let election = Arc::new(ElectionManager::new(
            store,
            worker_id.clone(),
            config.queue.leader.clone(),
        ));
        let dispatcher = TaskDispatcher::new(
            executor.clone(),
            DispatchMode::Queued {
                queue: Arc::clone(&queue),
                leadership: election.handle(),
                queue_name: config.queue.name.clone(),
                message_ttl: config.queue.executor.ttl(),
            },
        );
        let consumer = Arc::new(QueueConsumer::new(executor, queue, &config.queue.name));

        Ok(Self {
            config,
            registry,
            dispatcher,
            election: Some(election),
            consumer: Some(consumer),
            worker_id,
        })
    }

    pub fn worker_id(&self) -> &WorkerId {
        &self.worker_id
    }

    /// Read-only leadership view, present only with queueing enabled.
    pub fn leadership(&self) -> Option<LeadershipHandle> {
        self.election.as_ref().map(|e| e.handle())
    }

    /// Effective schedule for a task: config override, else the registered one.
    fn effective_schedule<'a>(&'a self, def: &'a TaskDefinition) -> &'a str {
        self.config
            .jobs
            .get(&def.name)
            .map(|job| job.schedule.as_str())
            .unwrap_or(&def.schedule)
    }

    /// Start all timer loops and run until `token` is cancelled.
    ///
    /// Performs an immediate election attempt before the first scheduled
    /// election tick, so a cold fleet gets a leader without waiting out the
    /// election cadence.
    pub async fn run(&self, token: CancellationToken) -> Result<()> {
        fclog!("Scheduler starting, worker {}", self.worker_id);
        let mut handles = Vec::new();

        if let Some(election) = &self.election {
            election.election_tick().await;

            let schedule = parse_schedule(&self.config.queue.leader.schedule)?;
            let election = Arc::clone(election);
            let child = token.child_token();
            handles.push(tokio::spawn(async move {
                run_cron_loop("becomeLeader", schedule, child, move || {
                    let election = Arc::clone(&election);
                    async move { election.election_tick().await }
                })
                .await;
            }));
        }

        if let Some(consumer) = &self.consumer {
            let schedule = parse_schedule(&self.config.queue.executor.schedule)?;
            let consumer = Arc::clone(consumer);
            let child = token.child_token();
            handles.push(tokio::spawn(async move {
                run_cron_loop("taskExecutor", schedule, child, move || {
                    let consumer = Arc::clone(&consumer);
                    async move { consumer.consume_tick().await }
                })
                .await;
            }));
        }

        for def in self.registry.definitions() {
            let name = def.name.clone();
            let timer_name = format!("{}{}", self.config.job_prefix, name);
            let schedule = parse_schedule(self.effective_schedule(def))?;
            let dispatcher = self.dispatcher.clone();
            let child = token.child_token();
            handles.push(tokio::spawn(async move {
                run_cron_loop(&timer_name, schedule, child, move || {
                    let dispatcher = dispatcher.clone();
                    let name = name.clone();
                    async move { dispatcher.dispatch(&name).await }
                })
                .await;
            }));
        }

        token.cancelled().await;
        for handle in handles {
            let _ = handle.await;
        }
        fclog!("Scheduler stopped, worker {}", self.worker_id);
        Ok(())
    }
}
