//! Event and user types.
//!
//! These are the records the store persists and the scheduler operates on.
//! All timestamps are UTC; timezone-aware recurrence is out of scope.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DaySyncError;

/// Default display color for events (matches the web UI palette).
pub const DEFAULT_COLOR: &str = "#3b82f6";

/// A concrete calendar event instance.
///
/// Recurring series are materialized at creation time: every occurrence is
/// its own `Event` row, tied together by `recurrence_group_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    /// Owning user; immutable after creation.
    pub owner_id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Display tag, opaque to the core.
    pub color: String,
    pub recurrence_pattern: RecurrencePattern,
    /// Present iff this event was created as part of a recurring series.
    /// All instances of one series share the same value.
    pub recurrence_group_id: Option<Uuid>,
    /// Sent-state per reminder kind. Flags transition false→true exactly
    /// once and are never reset.
    #[serde(default)]
    pub reminders_sent: BTreeMap<ReminderKind, bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Whether the given reminder kind has already been delivered.
    pub fn reminder_sent(&self, kind: ReminderKind) -> bool {
        self.reminders_sent.get(&kind).copied().unwrap_or(false)
    }
}

/// An event awaiting insertion; the store assigns `id`, `created_at` and
/// `updated_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDraft {
    pub owner_id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub color: String,
    pub recurrence_pattern: RecurrencePattern,
    pub recurrence_group_id: Option<Uuid>,
}

/// How an event repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrencePattern {
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrencePattern {
    /// Fixed occurrence cap per pattern: roughly one year of daily/weekly/
    /// monthly cadence, ten years for yearly.
    pub fn max_occurrences(self) -> usize {
        match self {
            RecurrencePattern::None => 1,
            RecurrencePattern::Daily => 365,
            RecurrencePattern::Weekly => 52,
            RecurrencePattern::Monthly => 12,
            RecurrencePattern::Yearly => 10,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecurrencePattern::None => "none",
            RecurrencePattern::Daily => "daily",
            RecurrencePattern::Weekly => "weekly",
            RecurrencePattern::Monthly => "monthly",
            RecurrencePattern::Yearly => "yearly",
        }
    }
}

impl FromStr for RecurrencePattern {
    type Err = DaySyncError;

    /// Unknown patterns are rejected explicitly; there is no silent
    /// fallback to `none`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(RecurrencePattern::None),
            "daily" => Ok(RecurrencePattern::Daily),
            "weekly" => Ok(RecurrencePattern::Weekly),
            "monthly" => Ok(RecurrencePattern::Monthly),
            "yearly" => Ok(RecurrencePattern::Yearly),
            other => Err(DaySyncError::Validation(format!(
                "unknown recurrence pattern '{other}'"
            ))),
        }
    }
}

impl fmt::Display for RecurrencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reminder lead time. Kept as an enum-keyed map on the event rather than
/// named boolean columns so new kinds need no schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReminderKind {
    #[serde(rename = "24h")]
    TwentyFourHour,
    #[serde(rename = "1h")]
    OneHour,
}

impl ReminderKind {
    pub const ALL: [ReminderKind; 2] = [ReminderKind::TwentyFourHour, ReminderKind::OneHour];

    /// How far ahead of the event start this reminder fires.
    pub fn lead_time(self) -> Duration {
        match self {
            ReminderKind::TwentyFourHour => Duration::hours(24),
            ReminderKind::OneHour => Duration::hours(1),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReminderKind::TwentyFourHour => "24h",
            ReminderKind::OneHour => "1h",
        }
    }
}

/// Whether a delete targets one occurrence or the whole series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteScope {
    Single,
    Series,
}

impl FromStr for DeleteScope {
    type Err = DaySyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(DeleteScope::Single),
            "series" => Ok(DeleteScope::Series),
            other => Err(DaySyncError::Validation(format!(
                "unknown delete scope '{other}' (expected 'single' or 'series')"
            ))),
        }
    }
}

/// A registered user, as far as the core cares: the reminder recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
