//! In-memory document store, optionally snapshotted to a JSON file.
//!
//! Backs a single-process deployment: all operations run under one
//! process-local lock, which makes `insert_many` atomic and
//! `claim_reminder` a true conditional update. When a snapshot path is
//! configured the full state is rewritten after every mutation and reloaded
//! at startup. A failed snapshot write rolls the in-memory change back, so
//! memory and disk never diverge and a failed create leaves no partial
//! series visible.
//!
//! Lock order is events before users everywhere.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EventFilter, EventPatch, EventStore, UserDirectory};
use crate::error::{DaySyncError, DaySyncResult};
use crate::event::{Event, EventDraft, ReminderKind, User};

/// On-disk snapshot shape.
#[derive(Serialize, Deserialize, Default)]
struct Snapshot {
    events: Vec<Event>,
    users: Vec<User>,
}

pub struct MemoryStore {
    events: RwLock<HashMap<Uuid, Event>>,
    users: RwLock<HashMap<Uuid, User>>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryStore {
    /// Create an empty store with no persistence.
    pub fn new() -> Self {
        MemoryStore {
            events: RwLock::new(HashMap::new()),
            users: RwLock::new(HashMap::new()),
            snapshot_path: None,
        }
    }

    /// Load a store from a JSON snapshot file, creating an empty store if
    /// the file does not exist yet. Mutations rewrite the snapshot.
    pub fn load(path: impl AsRef<Path>) -> DaySyncResult<Self> {
        let path = path.as_ref();
        let snapshot = if path.exists() {
            let bytes = std::fs::read(path)
                .map_err(|e| DaySyncError::Store(format!("read {}: {e}", path.display())))?;
            serde_json::from_slice(&bytes)
                .map_err(|e| DaySyncError::Store(format!("parse {}: {e}", path.display())))?
        } else {
            Snapshot::default()
        };

        Ok(MemoryStore {
            events: RwLock::new(snapshot.events.into_iter().map(|e| (e.id, e)).collect()),
            users: RwLock::new(snapshot.users.into_iter().map(|u| (u.id, u)).collect()),
            snapshot_path: Some(path.to_path_buf()),
        })
    }

    /// Number of stored events (mainly for tests).
    pub fn event_count(&self) -> usize {
        self.events.read().len()
    }

    /// Write the snapshot from already-locked state. Callers keep their
    /// write lock across this so a failure can be rolled back before the
    /// change ever becomes visible.
    fn write_snapshot(
        &self,
        events: &HashMap<Uuid, Event>,
        users: &HashMap<Uuid, User>,
    ) -> DaySyncResult<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let snapshot = Snapshot {
            events: events.values().cloned().collect(),
            users: users.values().cloned().collect(),
        };
        let json = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| DaySyncError::Store(format!("serialize snapshot: {e}")))?;
        std::fs::write(path, json)
            .map_err(|e| DaySyncError::Store(format!("write {}: {e}", path.display())))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn find(&self, filter: &EventFilter) -> DaySyncResult<Vec<Event>> {
        let mut matched: Vec<Event> = self
            .events
            .read()
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        matched.sort_by_key(|e| (e.start_time, e.id));
        Ok(matched)
    }

    async fn get(&self, id: Uuid) -> DaySyncResult<Option<Event>> {
        Ok(self.events.read().get(&id).cloned())
    }

    async fn insert_many(&self, drafts: Vec<EventDraft>) -> DaySyncResult<Vec<Event>> {
        let now = Utc::now();
        let mut created = Vec::with_capacity(drafts.len());

        let mut events = self.events.write();
        for draft in drafts {
            let event = Event {
                id: Uuid::new_v4(),
                owner_id: draft.owner_id,
                title: draft.title,
                start_time: draft.start_time,
                end_time: draft.end_time,
                color: draft.color,
                recurrence_pattern: draft.recurrence_pattern,
                recurrence_group_id: draft.recurrence_group_id,
                reminders_sent: Default::default(),
                created_at: now,
                updated_at: now,
            };
            events.insert(event.id, event.clone());
            created.push(event);
        }
        if let Err(e) = self.write_snapshot(&events, &self.users.read()) {
            // All or nothing: a failed create must not leave a partial
            // series visible.
            for event in &created {
                events.remove(&event.id);
            }
            return Err(e);
        }
        Ok(created)
    }

    async fn update(&self, id: Uuid, patch: EventPatch) -> DaySyncResult<Option<Event>> {
        let mut events = self.events.write();
        let previous = match events.get_mut(&id) {
            Some(event) => {
                let previous = event.clone();
                if let Some(title) = patch.title {
                    event.title = title;
                }
                if let Some(start) = patch.start_time {
                    event.start_time = start;
                }
                if let Some(end) = patch.end_time {
                    event.end_time = end;
                }
                if let Some(color) = patch.color {
                    event.color = color;
                }
                event.updated_at = Utc::now();
                previous
            }
            None => return Ok(None),
        };
        if let Err(e) = self.write_snapshot(&events, &self.users.read()) {
            events.insert(id, previous);
            return Err(e);
        }
        Ok(events.get(&id).cloned())
    }

    async fn claim_reminder(&self, id: Uuid, kind: ReminderKind) -> DaySyncResult<bool> {
        let mut events = self.events.write();
        let previous = match events.get_mut(&id) {
            Some(event) if !event.reminder_sent(kind) => {
                let previous = event.clone();
                event.reminders_sent.insert(kind, true);
                event.updated_at = Utc::now();
                previous
            }
            _ => return Ok(false),
        };
        if let Err(e) = self.write_snapshot(&events, &self.users.read()) {
            // The claim is reported as failed, so the flag must read false
            // again and the reminder stays eligible.
            events.insert(id, previous);
            return Err(e);
        }
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> DaySyncResult<bool> {
        let mut events = self.events.write();
        let Some(removed) = events.remove(&id) else {
            return Ok(false);
        };
        if let Err(e) = self.write_snapshot(&events, &self.users.read()) {
            events.insert(id, removed);
            return Err(e);
        }
        Ok(true)
    }

    async fn delete_many(&self, filter: &EventFilter) -> DaySyncResult<u64> {
        let mut events = self.events.write();
        let ids: Vec<Uuid> = events
            .values()
            .filter(|e| filter.matches(e))
            .map(|e| e.id)
            .collect();
        let mut removed = Vec::with_capacity(ids.len());
        for id in &ids {
            if let Some(event) = events.remove(id) {
                removed.push(event);
            }
        }
        if !removed.is_empty() {
            if let Err(e) = self.write_snapshot(&events, &self.users.read()) {
                for event in removed {
                    events.insert(event.id, event);
                }
                return Err(e);
            }
        }
        Ok(removed.len() as u64)
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn get_user(&self, id: Uuid) -> DaySyncResult<Option<User>> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn create_user(&self, email: String, name: String) -> DaySyncResult<User> {
        let user = User {
            id: Uuid::new_v4(),
            email,
            name,
            created_at: Utc::now(),
        };
        let events = self.events.read();
        let mut users = self.users.write();
        users.insert(user.id, user.clone());
        if let Err(e) = self.write_snapshot(&events, &users) {
            users.remove(&user.id);
            return Err(e);
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RecurrencePattern;
    use chrono::{Duration, TimeZone, Utc};

    fn draft(owner: Uuid, offset_hours: i64) -> EventDraft {
        let start = Utc.with_ymd_and_hms(2025, 3, 20, 15, 0, 0).unwrap()
            + Duration::hours(offset_hours);
        EventDraft {
            owner_id: owner,
            title: "Test Event".to_string(),
            start_time: start,
            end_time: start + Duration::hours(1),
            color: "#3b82f6".to_string(),
            recurrence_pattern: RecurrencePattern::None,
            recurrence_group_id: None,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_ids_and_preserves_order() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let created = store
            .insert_many(vec![draft(owner, 0), draft(owner, 1), draft(owner, 2)])
            .await
            .unwrap();
        assert_eq!(created.len(), 3);
        assert!(created[0].start_time < created[1].start_time);
        assert_eq!(store.event_count(), 3);
    }

    #[tokio::test]
    async fn test_claim_reminder_wins_once() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let created = store.insert_many(vec![draft(owner, 0)]).await.unwrap();
        let id = created[0].id;

        assert!(store
            .claim_reminder(id, ReminderKind::TwentyFourHour)
            .await
            .unwrap());
        // Second claim loses; the flag is never reset.
        assert!(!store
            .claim_reminder(id, ReminderKind::TwentyFourHour)
            .await
            .unwrap());
        // Other kinds are independent.
        assert!(store.claim_reminder(id, ReminderKind::OneHour).await.unwrap());

        let event = store.get(id).await.unwrap().unwrap();
        assert!(event.reminder_sent(ReminderKind::TwentyFourHour));
        assert!(event.reminder_sent(ReminderKind::OneHour));
    }

    #[tokio::test]
    async fn test_claim_on_missing_event_is_false() {
        let store = MemoryStore::new();
        assert!(!store
            .claim_reminder(Uuid::new_v4(), ReminderKind::OneHour)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_filter_owner_isolation() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store
            .insert_many(vec![draft(alice, 0), draft(bob, 0), draft(bob, 1)])
            .await
            .unwrap();

        let bobs = store.find(&EventFilter::owned_by(bob)).await.unwrap();
        assert_eq!(bobs.len(), 2);
        assert!(bobs.iter().all(|e| e.owner_id == bob));
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daysync.json");
        let owner = Uuid::new_v4();
        let id = {
            let store = MemoryStore::load(&path).unwrap();
            let created = store.insert_many(vec![draft(owner, 0)]).await.unwrap();
            store
                .claim_reminder(created[0].id, ReminderKind::OneHour)
                .await
                .unwrap();
            created[0].id
        };

        let reloaded = MemoryStore::load(&path).unwrap();
        let event = reloaded.get(id).await.unwrap().unwrap();
        assert_eq!(event.owner_id, owner);
        assert!(event.reminder_sent(ReminderKind::OneHour));
        assert!(!event.reminder_sent(ReminderKind::TwentyFourHour));
    }

    #[tokio::test]
    async fn test_failed_snapshot_write_leaves_no_partial_insert() {
        // A snapshot path under a directory that does not exist makes every
        // snapshot write fail.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("daysync.json");
        let store = MemoryStore::load(&path).unwrap();
        let owner = Uuid::new_v4();

        let err = store
            .insert_many(vec![draft(owner, 0), draft(owner, 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, DaySyncError::Store(_)));

        // The caller was told the create failed, so no instance of the
        // series may be visible.
        assert_eq!(store.event_count(), 0);
        assert!(store
            .find(&EventFilter::owned_by(owner))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_failed_snapshot_write_rolls_back_claim() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        std::fs::create_dir(&data_dir).unwrap();
        let path = data_dir.join("daysync.json");

        let store = MemoryStore::load(&path).unwrap();
        let owner = Uuid::new_v4();
        let created = store.insert_many(vec![draft(owner, 0)]).await.unwrap();
        let id = created[0].id;

        // Break persistence after the insert succeeded.
        std::fs::remove_dir_all(&data_dir).unwrap();

        let err = store
            .claim_reminder(id, ReminderKind::TwentyFourHour)
            .await
            .unwrap_err();
        assert!(matches!(err, DaySyncError::Store(_)));

        // The claim failed, so the flag must still read false and the
        // event stays eligible for the next tick.
        let event = store.get(id).await.unwrap().unwrap();
        assert!(!event.reminder_sent(ReminderKind::TwentyFourHour));
    }

    #[tokio::test]
    async fn test_failed_snapshot_write_rolls_back_delete() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        std::fs::create_dir(&data_dir).unwrap();
        let path = data_dir.join("daysync.json");

        let store = MemoryStore::load(&path).unwrap();
        let owner = Uuid::new_v4();
        let created = store.insert_many(vec![draft(owner, 0)]).await.unwrap();

        std::fs::remove_dir_all(&data_dir).unwrap();

        let err = store.delete(created[0].id).await.unwrap_err();
        assert!(matches!(err, DaySyncError::Store(_)));
        assert_eq!(store.event_count(), 1);
    }
}
