//! Reminder notifications: the delivery seam and message rendering.
//!
//! The core hands a recipient, subject and HTML body to a
//! [`NotificationSink`] and only cares whether the message was accepted for
//! delivery. SMTP transport itself lives outside the core; the bundled
//! [`LogSink`] just logs, and tests substitute recording mocks.

use async_trait::async_trait;
use tracing::info;

use crate::error::DaySyncResult;
use crate::event::{Event, ReminderKind};

/// Best-effort outbound notification channel.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Returns `Ok(true)` when the message was accepted for delivery.
    /// `Ok(false)` and `Err` both mean "not delivered"; the scheduler
    /// leaves the reminder flag unset and retries on a later tick.
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> DaySyncResult<bool>;
}

/// Sink that logs instead of delivering. Default for local development.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn send(&self, to: &str, subject: &str, _html_body: &str) -> DaySyncResult<bool> {
        info!(to, subject, "reminder notification (log sink, not delivered)");
        Ok(true)
    }
}

/// Subject line for a reminder email.
pub fn reminder_subject(kind: ReminderKind, title: &str) -> String {
    match kind {
        ReminderKind::TwentyFourHour => format!("📅 Reminder: \"{title}\" is Tomorrow!"),
        ReminderKind::OneHour => format!("⏰ URGENT: \"{title}\" starts in 1 HOUR!"),
    }
}

/// HTML body for a reminder email.
pub fn reminder_body(kind: ReminderKind, event: &Event) -> String {
    let lead_line = match kind {
        ReminderKind::TwentyFourHour => "Your event is coming tomorrow!",
        ReminderKind::OneHour => "It's time to get ready: only 60 minutes left!",
    };
    let start = event.start_time.format("%A, %B %-d %Y at %H:%M UTC");
    let end = event.end_time.format("%A, %B %-d %Y at %H:%M UTC");
    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <body style=\"font-family: sans-serif; margin: 0; padding: 20px;\">\n\
           <h2>📅 Event Reminder</h2>\n\
           <p>{lead_line}</p>\n\
           <h1>{title}</h1>\n\
           <p><strong>⏰ Start:</strong> {start}<br/>\n\
              <strong>🏁 End:</strong> {end}</p>\n\
           <p style=\"color: #999; font-size: 12px;\">✨ DaySync Smart Calendar ✨</p>\n\
         </body>\n\
         </html>",
        title = event.title,
    )
}
