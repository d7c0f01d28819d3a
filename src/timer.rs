//! Cron-schedule timer loops.
//!
//! Each periodic concern (election, queue consumption, every registered
//! task) gets its own loop on its own cadence. A tick is awaited to
//! completion before the next fire is computed, so a slow store or queue
//! call delays only its own timer and ticks of one timer never overlap.

use chrono::Utc;
use cron::Schedule;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::{fclog_debug, Error, Result};

/// Parse a cron expression with a seconds column, e.g. `"0 * * * * *"`.
pub fn parse_schedule(expr: &str) -> Result<Schedule> {
    Schedule::from_str(expr).map_err(|e| Error::schedule(expr, e))
}

/// Approximate interval between consecutive fires of `schedule`.
///
/// Derived from the gap between the next two occurrences; used only for
/// configuration sanity checks, not for scheduling itself.
pub fn schedule_interval(schedule: &Schedule) -> Option<Duration> {
    let mut upcoming = schedule.upcoming(Utc);
    let first = upcoming.next()?;
    let second = upcoming.next()?;
    (second - first).to_std().ok()
}

/// Run `tick` on every fire of `schedule` until `token` is cancelled.
///
/// The callback runs to completion before the next fire is scheduled.
pub async fn run_cron_loop<F, Fut>(
    name: &str,
    schedule: Schedule,
    token: CancellationToken,
    mut tick: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    fclog_debug!("Timer `{}` started", name);
    loop {
        let Some(next) = schedule.upcoming(Utc).next() else {
            fclog_debug!("Timer `{}` has no further occurrences, stopping", name);
            return;
        };
        let wait = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);

        tokio::select! {
            _ = token.cancelled() => {
                fclog_debug!("Timer `{}` cancelled", name);
                return;
            }
            _ = tokio::time::sleep(wait) => {}
        }

        tick().await;
    }
}
