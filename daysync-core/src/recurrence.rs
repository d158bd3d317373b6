//! Recurrence expansion for repeating events.
//!
//! Expands a recurrence pattern into concrete event instances at creation
//! time. Every instance preserves the base event's duration and fields;
//! only the start/end timestamps differ. The caller persists the returned
//! drafts with a single bulk insert.

use chrono::{DateTime, Duration, Months, Utc};
use uuid::Uuid;

use crate::error::{DaySyncError, DaySyncResult};
use crate::event::{EventDraft, RecurrencePattern};

/// Base fields shared by every instance of a series.
#[derive(Debug, Clone)]
pub struct EventSeed {
    pub owner_id: Uuid,
    pub title: String,
    pub color: String,
}

/// Expand a recurrence pattern into concrete event drafts.
///
/// For `pattern = none` this returns a single instance with no group id.
/// Otherwise it generates a strictly increasing sequence of start times
/// beginning at `start`, capped per pattern (daily→365, weekly→52,
/// monthly→12, yearly→10), all sharing one freshly minted
/// `recurrence_group_id`.
///
/// Monthly advance clamps to the last day of shorter months (Jan 31 →
/// Feb 28/29), and the clamp carries forward: subsequent occurrences
/// continue from the clamped day. Yearly advance clamps Feb 29 the same
/// way in non-leap years.
pub fn expand(
    seed: &EventSeed,
    pattern: RecurrencePattern,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> DaySyncResult<Vec<EventDraft>> {
    if end <= start {
        return Err(DaySyncError::Validation(
            "end_time must be after start_time".into(),
        ));
    }

    let draft = |start: DateTime<Utc>, end: DateTime<Utc>, group: Option<Uuid>| EventDraft {
        owner_id: seed.owner_id,
        title: seed.title.clone(),
        start_time: start,
        end_time: end,
        color: seed.color.clone(),
        recurrence_pattern: pattern,
        recurrence_group_id: group,
    };

    if pattern == RecurrencePattern::None {
        return Ok(vec![draft(start, end, None)]);
    }

    let duration = end - start;
    let group_id = Uuid::new_v4();
    let cap = pattern.max_occurrences();

    let mut drafts = Vec::with_capacity(cap);
    let mut current = start;
    while drafts.len() < cap {
        drafts.push(draft(current, current + duration, Some(group_id)));
        current = advance(current, pattern)?;
    }

    Ok(drafts)
}

/// Advance a start time by one calendar step of the given pattern.
fn advance(current: DateTime<Utc>, pattern: RecurrencePattern) -> DaySyncResult<DateTime<Utc>> {
    let next = match pattern {
        RecurrencePattern::None => Some(current),
        RecurrencePattern::Daily => current.checked_add_signed(Duration::days(1)),
        RecurrencePattern::Weekly => current.checked_add_signed(Duration::days(7)),
        // chrono's month arithmetic clamps the day-of-month to the end of
        // shorter target months, which is exactly the behavior we want.
        RecurrencePattern::Monthly => current.checked_add_months(Months::new(1)),
        RecurrencePattern::Yearly => current.checked_add_months(Months::new(12)),
    };
    next.ok_or_else(|| {
        DaySyncError::Validation(format!("start time {current} out of representable range"))
    })
}
