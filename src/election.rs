//! Leader election over a shared expiring key.
//!
//! Every process runs the same election tick on the same cadence: read the
//! leader record, claim it when absent or older than the change cooldown,
//! otherwise recognize whoever holds it. The cooldown gives the sitting
//! leader several renewal opportunities before a challenger is allowed in,
//! and the store TTL bounds how long a crashed leader's claim lingers.
//!
//! The claim is a plain read-then-write, not a compare-and-swap: two
//! processes can both observe a stale record and both write inside the same
//! race window, leaving dual leaders for at most one election interval. The
//! loser's next tick reads the winner's record and steps down. This window
//! is an accepted property of the protocol and is exercised directly by the
//! integration tests.

use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::LeaderConfig;
use crate::identity::WorkerId;
use crate::message::LeaderRecord;
use crate::store::KeyValueStore;
use crate::{fclog_debug, fclog_error};

/// Read-only view of a process's leadership state.
///
/// Owned by the `ElectionManager`; the dispatcher only ever reads it.
#[derive(Clone)]
pub struct LeadershipHandle(Arc<AtomicBool>);

impl LeadershipHandle {
    pub fn is_leader(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs the election tick and owns the local leadership flag.
pub struct ElectionManager {
    store: Arc<dyn KeyValueStore>,
    worker_id: WorkerId,
    config: LeaderConfig,
    leadership: Arc<AtomicBool>,
}

impl ElectionManager {
    pub fn new(store: Arc<dyn KeyValueStore>, worker_id: WorkerId, config: LeaderConfig) -> Self {
        Self {
            store,
            worker_id,
            config,
            // Unknown on startup is indistinguishable from false
            leadership: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn worker_id(&self) -> &WorkerId {
        &self.worker_id
    }

    pub fn handle(&self) -> LeadershipHandle {
        LeadershipHandle(Arc::clone(&self.leadership))
    }

    /// One election round.
    ///
    /// Store failures abandon the tick and leave the leadership flag
    /// unchanged: stale but safe until the next successful round. A record
    /// that fails to decode is logged and treated as absent.
    pub async fn election_tick(&self) {
        let raw = match self.store.get(&self.config.key).await {
            Ok(raw) => raw,
            Err(e) => {
                fclog_error!("Election tick: leader record read failed: {}", e);
                return;
            }
        };

        let record = raw.and_then(|raw| match LeaderRecord::decode(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                fclog_error!("Election tick: malformed leader record `{}`: {}", raw, e);
                None
            }
        });

        let now = Utc::now();
        match record {
            Some(record) if !record.older_than(self.config.change_cooldown(), now) => {
                let leader = record.worker_id == self.worker_id;
                self.leadership.store(leader, Ordering::SeqCst);
                if leader {
                    fclog_debug!("I'm cron leader! {}", self.worker_id);
                }
            }
            // Absent, undecodable, or past the cooldown: contest it
            _ => self.claim_leadership().await,
        }
    }

    /// Write a fresh claim under the leader key.
    ///
    /// A successful write makes this process leader unconditionally; there
    /// is no read-after-write reconciliation against concurrent claimants.
    async fn claim_leadership(&self) {
        let record = LeaderRecord::new(self.worker_id.clone(), Utc::now());
        let encoded = match record.encode() {
            Ok(encoded) => encoded,
            Err(e) => {
                fclog_error!("Election tick: leader record encode failed: {}", e);
                return;
            }
        };
        match self
            .store
            .set_with_expiry(&self.config.key, &encoded, self.config.ttl())
            .await
        {
            Ok(()) => {
                self.leadership.store(true, Ordering::SeqCst);
                fclog_debug!("I'm cron leader! {}", self.worker_id);
            }
            Err(e) => {
                fclog_error!("Election tick: leader record write failed: {}", e);
            }
        }
    }
}
