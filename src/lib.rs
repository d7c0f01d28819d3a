//! fleetcron: distributed cron coordination.
//!
//! Coordinates periodic task execution across a fleet of identical worker
//! processes so each scheduled task runs at most once per tick. Workers
//! agree on a leader through a shared expiring key-value store, and the
//! leader feeds an expiring-message queue that any worker may drain.

pub mod config;
pub mod consumer;
pub mod dispatch;
pub mod election;
pub mod error;
pub mod identity;
pub mod log;
pub mod message;
pub mod queue;
pub mod registry;
pub mod scheduler;
pub mod store;
pub mod timer;

pub use config::SchedulerConfig;
pub use election::LeadershipHandle;
pub use error::{Error, Result};
pub use identity::WorkerId;
pub use message::{LeaderRecord, TaskMessage};
pub use queue::{MemoryQueue, QueueTransport};
pub use registry::{TaskRegistry, TaskExecutor};
pub use scheduler::Scheduler;
pub use store::{KeyValueStore, MemoryStore};
