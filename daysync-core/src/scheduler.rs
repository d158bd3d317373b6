//! Periodic reminder scheduling.
//!
//! Every tick scans the store for events whose start time falls inside a
//! lookahead window (24 hours and 1 hour ahead, widened by a tolerance) and
//! whose reminder flag for that kind is still unset, delivers a notification,
//! and claims the flag on success. Failed sends leave the flag unset so the
//! event stays eligible on later ticks while it remains in-window; once the
//! start time passes it is simply never matched again.
//!
//! The tolerance must be at least as wide as the poll interval, otherwise
//! events starting between ticks are never observed. Construction enforces
//! this.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{DaySyncError, DaySyncResult};
use crate::event::{Event, ReminderKind};
use crate::notify::{reminder_body, reminder_subject, NotificationSink};
use crate::store::{EventFilter, EventStore, UserDirectory};

/// Scheduler tuning.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How often a tick runs.
    pub poll_interval: StdDuration,
    /// Width of each lookahead window. Must be >= `poll_interval` so every
    /// event is observed by at least one tick.
    pub tolerance: StdDuration,
    /// Upper bound on a single send attempt; a hung sink blocks only one
    /// event's processing, not the whole service.
    pub send_timeout: StdDuration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            poll_interval: StdDuration::from_secs(60),
            tolerance: StdDuration::from_secs(90),
            send_timeout: StdDuration::from_secs(30),
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> DaySyncResult<()> {
        if self.poll_interval.is_zero() {
            return Err(DaySyncError::Validation(
                "poll_interval must be non-zero".into(),
            ));
        }
        if self.tolerance < self.poll_interval {
            return Err(DaySyncError::Validation(format!(
                "tolerance ({:?}) must be >= poll_interval ({:?}), or events \
                 starting between ticks are never observed",
                self.tolerance, self.poll_interval
            )));
        }
        Ok(())
    }
}

/// Outcome of one tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

pub struct ReminderScheduler {
    store: Arc<dyn EventStore>,
    users: Arc<dyn UserDirectory>,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
    tolerance: Duration,
}

impl ReminderScheduler {
    pub fn new(
        store: Arc<dyn EventStore>,
        users: Arc<dyn UserDirectory>,
        sink: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> DaySyncResult<Self> {
        config.validate()?;
        let tolerance = Duration::from_std(config.tolerance)
            .map_err(|e| DaySyncError::Validation(format!("tolerance out of range: {e}")))?;
        Ok(ReminderScheduler {
            store,
            users,
            sink,
            clock,
            config,
            tolerance,
        })
    }

    /// Run ticks forever until the shutdown signal flips to true.
    ///
    /// Ticks never overlap: the next one is not started before the previous
    /// tick's store writes complete.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            poll_interval = ?self.config.poll_interval,
            tolerance = ?self.config.tolerance,
            "reminder scheduler started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = self.clock.now();
                    match self.run_once(now).await {
                        Ok(summary) if summary != TickSummary::default() => {
                            debug!(
                                sent = summary.sent,
                                failed = summary.failed,
                                skipped = summary.skipped,
                                "reminder tick finished"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => warn!(error = %e, "reminder tick aborted"),
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("reminder scheduler stopping");
                        return;
                    }
                }
            }
        }
    }

    /// One scan-and-notify pass at the given instant.
    ///
    /// An error from the store query aborts the tick; errors while
    /// processing a single event are isolated and counted in the summary.
    pub async fn run_once(&self, now: DateTime<Utc>) -> DaySyncResult<TickSummary> {
        let mut summary = TickSummary::default();

        for kind in ReminderKind::ALL {
            let window_start = now + kind.lead_time();
            let filter = EventFilter {
                starts_from: Some(window_start),
                starts_before: Some(window_start + self.tolerance),
                reminder_pending: Some(kind),
                ..Default::default()
            };
            let due = self.store.find(&filter).await?;

            for event in due {
                match self.remind(kind, &event).await {
                    Ok(true) => summary.sent += 1,
                    Ok(false) => summary.skipped += 1,
                    Err(e) => {
                        warn!(
                            event_id = %event.id,
                            kind = kind.label(),
                            error = %e,
                            "reminder not delivered; retrying on a later tick"
                        );
                        summary.failed += 1;
                    }
                }
            }
        }

        Ok(summary)
    }

    /// Deliver one reminder and claim its flag.
    ///
    /// `Ok(false)` means the event was skipped (owner unresolvable or
    /// another scheduler instance already sent this reminder); `Err` means
    /// delivery failed and the event stays eligible.
    async fn remind(&self, kind: ReminderKind, event: &Event) -> DaySyncResult<bool> {
        let Some(user) = self.users.get_user(event.owner_id).await? else {
            warn!(event_id = %event.id, owner_id = %event.owner_id, "owner not found, skipping reminder");
            return Ok(false);
        };
        if !user.email.contains('@') {
            warn!(event_id = %event.id, "owner has no usable email, skipping reminder");
            return Ok(false);
        }

        let subject = reminder_subject(kind, &event.title);
        let body = reminder_body(kind, event);

        let accepted = match tokio::time::timeout(
            self.config.send_timeout,
            self.sink.send(&user.email, &subject, &body),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(DaySyncError::Delivery(format!(
                    "send timed out after {:?}",
                    self.config.send_timeout
                )))
            }
        };
        if !accepted {
            return Err(DaySyncError::Delivery("sink rejected message".into()));
        }

        // Conditional claim: with concurrent scheduler instances a duplicate
        // delivery is still possible here, but the flag itself flips at most
        // once and losing the claim means another instance handled it.
        if !self.store.claim_reminder(event.id, kind).await? {
            debug!(event_id = %event.id, kind = kind.label(), "reminder already claimed elsewhere");
            return Ok(false);
        }
        Ok(true)
    }
}
