//! Adaptive polling of a scheduled transaction's ledger status
//!
//! The poller keeps a session's snapshot of a scheduled transaction fresh
//! until a terminal condition, tightening the interval while the schedule is
//! changing and backing off once it goes quiet.
use crate::services::{Notification, ScheduleInfo, ScheduleStatus};
use crate::session::SessionInner;
use crate::transaction::{Network, ParsedTransaction};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Four-tier backoff over the number of consecutive unchanged polls.
pub fn backoff_interval(poll_count: u32) -> Duration {
    if poll_count < 3 {
        Duration::from_secs(2)
    } else if poll_count < 6 {
        Duration::from_secs(5)
    } else if poll_count < 10 {
        Duration::from_secs(10)
    } else {
        Duration::from_secs(30)
    }
}

/// Tracks consecutive unchanged polls and the last observed schedule shape.
#[derive(Debug, Default)]
pub struct PollState {
    count: u32,
    fingerprint: Option<Fingerprint>,
}

#[derive(Debug, Clone, PartialEq)]
struct Fingerprint {
    executed: bool,
    executed_timestamp: Option<String>,
    body: Value,
}

impl PollState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_interval(&self) -> Duration {
        backoff_interval(self.count)
    }

    /// Record one observation. Returns true when the data changed since the
    /// previous poll, which resets the backoff so an active schedule keeps
    /// being polled tightly.
    pub fn record(&mut self, status: &ScheduleStatus, info: &ScheduleInfo) -> bool {
        let fingerprint = Fingerprint {
            executed: status.executed,
            executed_timestamp: info.executed_timestamp.clone(),
            body: info.transaction_body.clone(),
        };
        let changed = self.fingerprint.as_ref() != Some(&fingerprint);
        if changed {
            self.count = 0;
        } else {
            self.count = self.count.saturating_add(1);
        }
        self.fingerprint = Some(fingerprint);
        changed
    }
}

/// Age of a schedule based on its service-reported creation timestamp.
pub fn schedule_age(info: &ScheduleInfo) -> Option<Duration> {
    let created = crate::utils::parse_consensus_timestamp(info.consensus_timestamp.as_deref()?)?;
    (Utc::now() - created).to_std().ok()
}

enum Poll {
    Continue,
    Stop,
}

/// Drive one session's schedule polling until a terminal condition. Spawned
/// by the session; aborting the task is the cancellation path, so there is
/// never more than one outstanding timer per session.
pub(crate) async fn run(inner: Arc<SessionInner>) {
    let Some(schedule_id) = inner.intent.schedule_id().map(str::to_string) else {
        return;
    };
    let network = inner.intent.network;
    let mut poll = PollState::new();

    loop {
        if inner.is_disposed() || inner.lifecycle().is_terminal() {
            break;
        }
        match poll_once(&inner, &schedule_id, network, &mut poll).await {
            Poll::Continue => {}
            Poll::Stop => break,
        }
        tokio::time::sleep(poll.next_interval()).await;
    }
    tracing::debug!(%schedule_id, "schedule polling stopped");
}

async fn poll_once(
    inner: &SessionInner,
    schedule_id: &str,
    network: Network,
    poll: &mut PollState,
) -> Poll {
    let schedule = &inner.services.schedule;

    let status = match schedule
        .get_scheduled_transaction_status(schedule_id, network)
        .await
    {
        Ok(status) => status,
        Err(error) => {
            // Transient transport failures keep the poller alive.
            tracing::warn!(%schedule_id, "schedule status fetch failed: {error:#}");
            inner.services.notifier.notify(Notification::warning(
                "Schedule refresh failed",
                format!("Could not refresh scheduled transaction {schedule_id}: {error}"),
            ));
            return Poll::Continue;
        }
    };

    if status.executed {
        inner.mark_schedule_settled(status.executed_date.as_deref());
        return Poll::Stop;
    }

    let info = match schedule.get_schedule_info(schedule_id, network).await {
        Ok(Some(info)) => info,
        Ok(None) => {
            // An expired-and-pruned schedule is indistinguishable from a
            // consumed one; both read as settled.
            tracing::info!(%schedule_id, "schedule no longer known to the ledger");
            inner.mark_schedule_settled(None);
            return Poll::Stop;
        }
        Err(error) => {
            tracing::warn!(%schedule_id, "schedule info fetch failed: {error:#}");
            inner.services.notifier.notify(Notification::warning(
                "Schedule refresh failed",
                format!("Could not refresh scheduled transaction {schedule_id}: {error}"),
            ));
            return Poll::Continue;
        }
    };

    if let Some(age) = schedule_age(&info) {
        if age >= inner.config.schedule_max_age {
            // Status was checked above this tick and was not executed, so
            // the final state is confirmed; stop here.
            tracing::info!(%schedule_id, age_secs = age.as_secs(), "schedule exceeded max age");
            inner.mark_schedule_expired();
            return Poll::Stop;
        }
    }

    if !info.transaction_body.is_null() {
        match serde_json::from_value::<ParsedTransaction>(info.transaction_body.clone()) {
            Ok(mut snapshot) => {
                if snapshot.memo.is_none() {
                    snapshot.memo = info.memo.clone();
                }
                inner.update_snapshot(snapshot);
            }
            Err(error) => {
                tracing::warn!(%schedule_id, "undecodable schedule body: {error}");
            }
        }
    }

    if poll.record(&status, &info) {
        tracing::debug!(%schedule_id, "schedule data changed, poll interval reset");
    }

    Poll::Continue
}
