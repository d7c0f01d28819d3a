//! Wire formats shared through the store and the queue.
//!
//! `LeaderRecord` is JSON under a single well-known key in the key-value
//! store. `TaskMessage` is a delimited string on the queue transport:
//! `"<taskName>.<expiryEpochMillis>"`. Both use epoch milliseconds so any
//! process in the fleet can compare them against its own clock.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::WorkerId;
use crate::{Error, Result};

/// The leadership claim stored under the shared leader key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderRecord {
    #[serde(rename = "workerId")]
    pub worker_id: WorkerId,
    /// Claim time, epoch milliseconds.
    pub timestamp: i64,
}

impl LeaderRecord {
    pub fn new(worker_id: WorkerId, now: DateTime<Utc>) -> Self {
        Self {
            worker_id,
            timestamp: now.timestamp_millis(),
        }
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// True when the claim is older than `cooldown` relative to `now`,
    /// meaning any process may contest it.
    pub fn older_than(&self, cooldown: Duration, now: DateTime<Utc>) -> bool {
        self.timestamp < (now - cooldown).timestamp_millis()
    }
}

/// A deferred task execution request on the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskMessage {
    pub task: String,
    /// Absolute expiry, epoch milliseconds. Past this instant the message
    /// is discarded at consumption time instead of executed.
    pub expires_at: i64,
}

impl TaskMessage {
    pub fn new(task: &str, expires_at: DateTime<Utc>) -> Self {
        Self {
            task: task.to_string(),
            expires_at: expires_at.timestamp_millis(),
        }
    }

    pub fn encode(&self) -> String {
        format!("{}.{}", self.task, self.expires_at)
    }

    /// Split on the last dot so task names containing dots round-trip.
    pub fn decode(raw: &str) -> Result<Self> {
        let (task, expiry) = raw
            .rsplit_once('.')
            .ok_or_else(|| Error::MalformedMessage(raw.to_string()))?;
        if task.is_empty() {
            return Err(Error::MalformedMessage(raw.to_string()));
        }
        let expires_at: i64 = expiry
            .parse()
            .map_err(|_| Error::MalformedMessage(raw.to_string()))?;
        Ok(Self {
            task: task.to_string(),
            expires_at,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() > self.expires_at
    }
}
