//! Per-process worker identity.
//!
//! Each process generates one random `WorkerId` at startup and keeps it for
//! its whole lifetime. The id is what a `LeaderRecord` carries, so a process
//! recognizes its own leadership claim when it reads the record back.
//! Uniqueness is probabilistic (random v4 UUID), never persisted.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// An opaque, process-lifetime-scoped worker identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(String);

impl WorkerId {
    /// Generate a fresh random identity.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
