//! Due-date reminder determination.
//!
//! Three reminder rules ordered by urgency, first match wins. The two
//! dated windows carry event-log cooldowns; the overdue rule has none and
//! keeps firing every sweep until the task completes, which is the
//! long-standing product behavior.

use chrono::{DateTime, Duration, Timelike, Utc};

use crate::domain::models::{NotificationKind, ReminderConfig, Task, TaskStatus};
use crate::services::history::EventHistory;

/// Hours before the day-out reminder may repeat.
pub const UPCOMING_COOLDOWN_HOURS: i64 = 22;

/// Hours before the due-day reminder may repeat.
pub const DUE_TODAY_COOLDOWN_HOURS: i64 = 12;

/// Which reminder is due for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    /// Past the due date
    Overdue,
    /// Roughly a day before the due date
    Upcoming24h,
    /// The morning of the due date
    DueToday,
}

impl ReminderKind {
    /// Kind string stored in the `ReminderSent` event's new value.
    /// Cooldown lookups key off this exact string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overdue => "overdue",
            Self::Upcoming24h => "24h",
            Self::DueToday => "due_today",
        }
    }

    /// Notification kind delivered when this reminder fires.
    pub fn notification_kind(&self) -> NotificationKind {
        match self {
            Self::Overdue => NotificationKind::ReminderOverdue,
            Self::Upcoming24h => NotificationKind::ReminderUpcoming,
            Self::DueToday => NotificationKind::ReminderDueToday,
        }
    }
}

/// Decide which reminder, if any, is due for a task right now.
///
/// The caller appends the matching `ReminderSent` event before delivering
/// the notification, so the next evaluation sees the cooldown.
pub fn next_reminder(
    task: &Task,
    history: &EventHistory,
    now: DateTime<Utc>,
    windows: &ReminderConfig,
) -> Option<ReminderKind> {
    if task.status == TaskStatus::Completed {
        return None;
    }

    // Rule 1: past due. No cooldown; also forces the flag hard upstream.
    if now > task.due_date {
        return Some(ReminderKind::Overdue);
    }

    // Rule 2: inside the configured day-out window.
    let until_due = task.due_date - now;
    if until_due >= Duration::hours(windows.upcoming_window_start_hours)
        && until_due <= Duration::hours(windows.upcoming_window_end_hours)
        && cooled_down(
            history.last_reminder_at(task.id, ReminderKind::Upcoming24h.as_str()),
            UPCOMING_COOLDOWN_HOURS,
            now,
        )
    {
        return Some(ReminderKind::Upcoming24h);
    }

    // Rule 3: morning of the due day, UTC.
    if now.date_naive() == task.due_date.date_naive()
        && (windows.due_day_start_hour..windows.due_day_end_hour).contains(&now.hour())
        && cooled_down(
            history.last_reminder_at(task.id, ReminderKind::DueToday.as_str()),
            DUE_TODAY_COOLDOWN_HOURS,
            now,
        )
    {
        return Some(ReminderKind::DueToday);
    }

    None
}

fn cooled_down(last_sent: Option<DateTime<Utc>>, hours: i64, now: DateTime<Utc>) -> bool {
    match last_sent {
        None => true,
        Some(at) => now - at > Duration::hours(hours),
    }
}
