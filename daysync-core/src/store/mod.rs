//! Persistence seams: the event store and user directory traits.
//!
//! The core talks to its document store through these traits only. The
//! provided [`MemoryStore`] backs a single-process deployment (optionally
//! snapshotted to a JSON file); tests use it directly.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DaySyncResult;
use crate::event::{Event, EventDraft, ReminderKind, User};

/// Predicates the store must support: equality on owner/group, a range on
/// `start_time`, and "reminder of this kind not yet sent".
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub owner_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    /// Inclusive lower bound on `start_time`.
    pub starts_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `start_time` (scheduler windows are
    /// half-open).
    pub starts_before: Option<DateTime<Utc>>,
    pub reminder_pending: Option<ReminderKind>,
}

impl EventFilter {
    pub fn owned_by(owner_id: Uuid) -> Self {
        EventFilter {
            owner_id: Some(owner_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, event: &Event) -> bool {
        if let Some(owner) = self.owner_id {
            if event.owner_id != owner {
                return false;
            }
        }
        if let Some(group) = self.group_id {
            if event.recurrence_group_id != Some(group) {
                return false;
            }
        }
        if let Some(from) = self.starts_from {
            if event.start_time < from {
                return false;
            }
        }
        if let Some(before) = self.starts_before {
            if event.start_time >= before {
                return false;
            }
        }
        if let Some(kind) = self.reminder_pending {
            if event.reminder_sent(kind) {
                return false;
            }
        }
        true
    }
}

/// Fields a direct user edit may change. `None` leaves the field as-is.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub color: Option<String>,
}

/// The document store for events.
///
/// `insert_many` is atomic: either every draft is persisted or none are.
/// `claim_reminder` is the conditional set-true-iff-false update that keeps
/// reminder delivery at-most-once even with concurrent schedulers.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn find(&self, filter: &EventFilter) -> DaySyncResult<Vec<Event>>;

    async fn get(&self, id: Uuid) -> DaySyncResult<Option<Event>>;

    async fn insert_many(&self, drafts: Vec<EventDraft>) -> DaySyncResult<Vec<Event>>;

    /// Returns the updated event, or `None` if the id is unknown.
    async fn update(&self, id: Uuid, patch: EventPatch) -> DaySyncResult<Option<Event>>;

    /// Set the reminder flag true iff it is currently false. Returns whether
    /// this call won the claim; `false` means the flag was already set (or
    /// the event no longer exists).
    async fn claim_reminder(&self, id: Uuid, kind: ReminderKind) -> DaySyncResult<bool>;

    /// Returns whether an event was removed.
    async fn delete(&self, id: Uuid) -> DaySyncResult<bool>;

    /// Returns the number of events removed.
    async fn delete_many(&self, filter: &EventFilter) -> DaySyncResult<u64>;
}

/// Lookup of reminder recipients.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user(&self, id: Uuid) -> DaySyncResult<Option<User>>;

    async fn create_user(&self, email: String, name: String) -> DaySyncResult<User>;
}
