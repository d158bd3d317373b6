//! Event operations: create with recurrence, list, update, recent changes,
//! and the deletion resolver.
//!
//! Every operation takes an explicit `owner_id`; the auth layer upstream is
//! expected to have established it. Events belonging to other owners are
//! reported as not found rather than forbidden, so existence never leaks.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{DaySyncError, DaySyncResult};
use crate::event::{DeleteScope, Event, RecurrencePattern, DEFAULT_COLOR};
use crate::recurrence::{self, EventSeed};
use crate::store::{EventFilter, EventPatch, EventStore};

/// Parameters for creating an event (single or recurring).
#[derive(Debug, Clone)]
pub struct CreateEvent {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub color: Option<String>,
    pub recurrence_pattern: RecurrencePattern,
}

/// Create an event, expanding recurrence into a series where requested.
///
/// The whole series is persisted with one atomic bulk insert; a store
/// failure leaves no partial series behind. Returns the first instance as
/// the representative result.
pub async fn create_event(
    store: &dyn EventStore,
    owner_id: Uuid,
    req: CreateEvent,
) -> DaySyncResult<Event> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(DaySyncError::Validation("title must not be empty".into()));
    }

    let seed = EventSeed {
        owner_id,
        title: title.to_string(),
        color: req.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
    };
    let drafts = recurrence::expand(&seed, req.recurrence_pattern, req.start_time, req.end_time)?;

    let created = store.insert_many(drafts).await?;
    created
        .into_iter()
        .next()
        .ok_or_else(|| DaySyncError::Store("bulk insert returned no events".into()))
}

/// List an owner's events, optionally restricted to a start-time range
/// (inclusive on both ends, matching the calendar UI's month queries).
pub async fn list_events(
    store: &dyn EventStore,
    owner_id: Uuid,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> DaySyncResult<Vec<Event>> {
    let filter = EventFilter {
        owner_id: Some(owner_id),
        starts_from: from,
        ..Default::default()
    };
    let mut events = store.find(&filter).await?;
    if let Some(to) = to {
        events.retain(|e| e.start_time <= to);
    }
    Ok(events)
}

/// An owner's most recently touched events, newest first.
pub async fn recent_changes(
    store: &dyn EventStore,
    owner_id: Uuid,
    limit: usize,
) -> DaySyncResult<Vec<Event>> {
    let mut events = store.find(&EventFilter::owned_by(owner_id)).await?;
    events.sort_by(|a, b| {
        (b.updated_at, b.created_at).cmp(&(a.updated_at, a.created_at))
    });
    events.truncate(limit);
    Ok(events)
}

/// Apply a direct user edit to one event.
pub async fn update_event(
    store: &dyn EventStore,
    owner_id: Uuid,
    event_id: Uuid,
    patch: EventPatch,
) -> DaySyncResult<Event> {
    let existing = owned_event(store, owner_id, event_id).await?;

    if let Some(title) = &patch.title {
        if title.trim().is_empty() {
            return Err(DaySyncError::Validation("title must not be empty".into()));
        }
    }
    let start = patch.start_time.unwrap_or(existing.start_time);
    let end = patch.end_time.unwrap_or(existing.end_time);
    if end <= start {
        return Err(DaySyncError::Validation(
            "end_time must be after start_time".into(),
        ));
    }

    store
        .update(event_id, patch)
        .await?
        .ok_or_else(|| not_found(event_id))
}

/// Delete one occurrence or a whole series. Returns how many events were
/// removed.
///
/// `Series` on an event without a group id degrades to `Single`. A repeated
/// series delete fails with `NotFound`: the anchor lookup precedes the
/// cascade.
pub async fn delete_event(
    store: &dyn EventStore,
    owner_id: Uuid,
    event_id: Uuid,
    scope: DeleteScope,
) -> DaySyncResult<u64> {
    let event = owned_event(store, owner_id, event_id).await?;

    match (scope, event.recurrence_group_id) {
        (DeleteScope::Series, Some(group_id)) => {
            let filter = EventFilter {
                owner_id: Some(owner_id),
                group_id: Some(group_id),
                ..Default::default()
            };
            store.delete_many(&filter).await
        }
        _ => {
            if store.delete(event_id).await? {
                Ok(1)
            } else {
                Err(not_found(event_id))
            }
        }
    }
}

fn not_found(event_id: Uuid) -> DaySyncError {
    DaySyncError::NotFound(format!("event {event_id}"))
}

/// Fetch an event iff it belongs to `owner_id`; a miss and a foreign owner
/// produce the same error.
async fn owned_event(
    store: &dyn EventStore,
    owner_id: Uuid,
    event_id: Uuid,
) -> DaySyncResult<Event> {
    match store.get(event_id).await? {
        Some(event) if event.owner_id == owner_id => Ok(event),
        _ => Err(not_found(event_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn request(pattern: RecurrencePattern) -> CreateEvent {
        let start = Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap();
        CreateEvent {
            title: "Weekly Sync".to_string(),
            start_time: start,
            end_time: start + Duration::hours(1),
            color: None,
            recurrence_pattern: pattern,
        }
    }

    #[tokio::test]
    async fn test_create_returns_first_instance() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let req = request(RecurrencePattern::Weekly);
        let first = create_event(&store, owner, req.clone()).await.unwrap();

        assert_eq!(first.start_time, req.start_time);
        assert_eq!(first.color, DEFAULT_COLOR);
        assert!(first.recurrence_group_id.is_some());
        assert_eq!(store.event_count(), 52);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_title() {
        let store = MemoryStore::new();
        let mut req = request(RecurrencePattern::None);
        req.title = "   ".to_string();
        let err = create_event(&store, Uuid::new_v4(), req).await.unwrap_err();
        assert!(matches!(err, DaySyncError::Validation(_)));
        assert_eq!(store.event_count(), 0);
    }

    #[tokio::test]
    async fn test_list_range_is_inclusive() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let first = create_event(&store, owner, request(RecurrencePattern::Daily))
            .await
            .unwrap();

        let from = first.start_time;
        let to = first.start_time + Duration::days(6);
        let week = list_events(&store, owner, Some(from), Some(to)).await.unwrap();
        assert_eq!(week.len(), 7);
        assert_eq!(week.first().unwrap().start_time, from);
        assert_eq!(week.last().unwrap().start_time, to);
    }

    #[tokio::test]
    async fn test_list_hides_other_owners() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        create_event(&store, alice, request(RecurrencePattern::None))
            .await
            .unwrap();

        assert!(list_events(&store, bob, None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_refreshes_and_validates() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let event = create_event(&store, owner, request(RecurrencePattern::None))
            .await
            .unwrap();

        let updated = update_event(
            &store,
            owner,
            event.id,
            EventPatch {
                title: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.title, "Renamed");
        assert!(updated.updated_at >= event.updated_at);

        // Moving the end before the start is rejected.
        let err = update_event(
            &store,
            owner,
            event.id,
            EventPatch {
                end_time: Some(event.start_time - Duration::minutes(5)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DaySyncError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_foreign_event_is_not_found() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let event = create_event(&store, owner, request(RecurrencePattern::None))
            .await
            .unwrap();

        let err = update_event(&store, Uuid::new_v4(), event.id, EventPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DaySyncError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_recent_changes_newest_first() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let a = create_event(&store, owner, request(RecurrencePattern::None))
            .await
            .unwrap();
        let mut req = request(RecurrencePattern::None);
        req.title = "Second".to_string();
        create_event(&store, owner, req).await.unwrap();

        // Touch the first event so it becomes the most recent.
        update_event(
            &store,
            owner,
            a.id,
            EventPatch {
                color: Some("#ef4444".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let recent = recent_changes(&store, owner, 20).await.unwrap();
        assert_eq!(recent[0].id, a.id);

        let limited = recent_changes(&store, owner, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_single_leaves_rest_of_series() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let first = create_event(&store, owner, request(RecurrencePattern::Monthly))
            .await
            .unwrap();

        let removed = delete_event(&store, owner, first.id, DeleteScope::Single)
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.event_count(), 11);
    }

    #[tokio::test]
    async fn test_delete_series_removes_all_instances() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let first = create_event(&store, owner, request(RecurrencePattern::Monthly))
            .await
            .unwrap();

        let removed = delete_event(&store, owner, first.id, DeleteScope::Series)
            .await
            .unwrap();
        assert_eq!(removed, 12);
        assert_eq!(store.event_count(), 0);

        // Second series delete: the anchor is gone.
        let err = delete_event(&store, owner, first.id, DeleteScope::Series)
            .await
            .unwrap_err();
        assert!(matches!(err, DaySyncError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_series_delete_without_group_degrades_to_single() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let event = create_event(&store, owner, request(RecurrencePattern::None))
            .await
            .unwrap();

        let removed = delete_event(&store, owner, event.id, DeleteScope::Series)
            .await
            .unwrap();
        assert_eq!(removed, 1);
    }

    #[tokio::test]
    async fn test_delete_foreign_event_is_not_found() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let event = create_event(&store, owner, request(RecurrencePattern::None))
            .await
            .unwrap();

        let err = delete_event(&store, Uuid::new_v4(), event.id, DeleteScope::Single)
            .await
            .unwrap_err();
        assert!(matches!(err, DaySyncError::NotFound(_)));
        assert_eq!(store.event_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_already_deleted_is_not_found() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let event = create_event(&store, owner, request(RecurrencePattern::None))
            .await
            .unwrap();

        delete_event(&store, owner, event.id, DeleteScope::Single)
            .await
            .unwrap();
        let err = delete_event(&store, owner, event.id, DeleteScope::Single)
            .await
            .unwrap_err();
        assert!(matches!(err, DaySyncError::NotFound(_)));
    }
}
