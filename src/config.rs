//! Scheduler configuration.
//!
//! Mirrors the deployment knobs of the coordination layer: whether the
//! shared queue is enabled, the leader lease parameters, the consumer
//! cadence, and optional per-job schedule overrides. Handlers are code, so
//! they live in the `TaskRegistry`, not here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::timer::{parse_schedule, schedule_interval};
use crate::{fclog_debug, Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Prefix for per-task timer names.
    pub job_prefix: String,
    pub queue: QueueConfig,
    /// Per-job schedule overrides, keyed by registered task name.
    pub jobs: BTreeMap<String, JobConfig>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            job_prefix: "scheduler_".to_string(),
            queue: QueueConfig::default(),
            jobs: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// When false, every process runs the full schedule locally and the
    /// store and queue are never touched.
    pub enable: bool,
    /// Queue name on the transport.
    pub name: String,
    pub leader: LeaderConfig,
    pub executor: ExecutorConfig,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            enable: false,
            name: "tasks".to_string(),
            leader: LeaderConfig::default(),
            executor: ExecutorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderConfig {
    /// Well-known store key holding the `LeaderRecord`.
    pub key: String,
    /// Store-enforced expiry of the leader key, seconds. Bounds how long a
    /// crashed leader's claim lingers.
    pub ttl_secs: u64,
    /// Minimum record age before another process may contest it, seconds.
    pub change_cooldown_secs: u64,
    /// Election tick cadence.
    pub schedule: String,
}

impl Default for LeaderConfig {
    fn default() -> Self {
        Self {
            key: "scheduler:leader".to_string(),
            ttl_secs: 86_400,
            change_cooldown_secs: 3_600,
            schedule: "0 * * * * *".to_string(),
        }
    }
}

impl LeaderConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl_secs as i64)
    }

    pub fn change_cooldown(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.change_cooldown_secs as i64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Queue consumer tick cadence.
    pub schedule: String,
    /// Lifetime of a queued message, seconds. Must cover at least one
    /// consumer tick so every message gets a chance to be popped.
    pub ttl_secs: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            schedule: "* * * * * *".to_string(),
            ttl_secs: 60,
        }
    }
}

impl ExecutorConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl_secs as i64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub schedule: String,
}

impl SchedulerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        fclog_debug!("SchedulerConfig::load path={}", path.display());
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        fclog_debug!(
            "Config loaded: queue.enable={}, queue.name={}, jobs={}",
            config.queue.enable,
            config.queue.name,
            config.jobs.len()
        );
        Ok(config)
    }

    /// Check the timing invariants of the coordination layer.
    ///
    /// With queueing enabled:
    /// - `change_cooldown < leader ttl`, so a live leader's claim cannot
    ///   expire before it is contestable;
    /// - election interval < `change_cooldown`, so the leader renews more
    ///   than once before a challenger is allowed in;
    /// - consumer interval <= executor ttl, so a queued message survives at
    ///   least one consumer tick.
    ///
    /// Job schedule overrides must always parse.
    pub fn validate(&self) -> Result<()> {
        for (name, job) in &self.jobs {
            parse_schedule(&job.schedule).map_err(|e| {
                Error::InvalidConfig(format!("job `{}`: {}", name, e))
            })?;
        }

        if !self.queue.enable {
            return Ok(());
        }

        let leader = &self.queue.leader;
        if leader.change_cooldown_secs >= leader.ttl_secs {
            return Err(Error::InvalidConfig(format!(
                "change_cooldown_secs ({}) must be strictly less than ttl_secs ({})",
                leader.change_cooldown_secs, leader.ttl_secs
            )));
        }

        let election = parse_schedule(&leader.schedule)?;
        let election_interval = schedule_interval(&election).ok_or_else(|| {
            Error::InvalidConfig(format!(
                "leader schedule `{}` never fires twice",
                leader.schedule
            ))
        })?;
        if election_interval >= Duration::from_secs(leader.change_cooldown_secs) {
            return Err(Error::InvalidConfig(format!(
                "election interval ({:?}) must be strictly less than change_cooldown_secs ({})",
                election_interval, leader.change_cooldown_secs
            )));
        }

        let executor = &self.queue.executor;
        let consumer = parse_schedule(&executor.schedule)?;
        let consumer_interval = schedule_interval(&consumer).ok_or_else(|| {
            Error::InvalidConfig(format!(
                "executor schedule `{}` never fires twice",
                executor.schedule
            ))
        })?;
        if consumer_interval > Duration::from_secs(executor.ttl_secs) {
            return Err(Error::InvalidConfig(format!(
                "consumer interval ({:?}) exceeds executor ttl_secs ({}); \
                 queued messages would expire before any pop",
                consumer_interval, executor.ttl_secs
            )));
        }

        Ok(())
    }
}
