//! Core library for DaySync.
//!
//! This crate provides the calendar backend's domain logic:
//! - `event` — the event/user records and their small enums
//! - `recurrence` — expansion of a pattern into concrete instances
//! - `scheduler` — the periodic reminder scan-and-notify loop
//! - `events` — create/list/update/delete operations, including the
//!   single-vs-series deletion resolver
//! - `store` / `notify` — the persistence and delivery seams

pub mod clock;
pub mod error;
pub mod event;
pub mod events;
pub mod notify;
pub mod recurrence;
pub mod scheduler;
pub mod store;

pub use error::{DaySyncError, DaySyncResult};
pub use event::*;
