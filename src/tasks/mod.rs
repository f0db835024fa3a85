//! Derived task status and study-plan ranking.
//!
//! Status is never stored: it is recomputed from the completion flag and the
//! due date on every read, so it can never go stale against the clock. The
//! reference date is always an explicit parameter — nothing in this module
//! touches the system clock, which keeps every function deterministic.

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::Task;

// ─── Status classification ───────────────────────────────────────────────────

/// Four-state task status, derived at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Completed,
    Overdue,
    DueToday,
    Pending,
}

impl Status {
    /// Classify a task relative to `today`. Completion wins over any
    /// due-date comparison, so a finished task is never reported overdue.
    pub fn classify(completed: bool, due_date: NaiveDate, today: NaiveDate) -> Self {
        if completed {
            Status::Completed
        } else if due_date < today {
            Status::Overdue
        } else if due_date == today {
            Status::DueToday
        } else {
            Status::Pending
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Completed => "Completed",
            Status::Overdue   => "Overdue",
            Status::DueToday  => "Due Today",
            Status::Pending   => "Pending",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Task {
    pub fn status_on(&self, today: NaiveDate) -> Status {
        Status::classify(self.completed, self.due_date, today)
    }
}

// ─── Due-date alerts ──────────────────────────────────────────────────────────

/// Alert text for a due-or-overdue date, `None` if the date is still ahead.
/// Shared by the reminder, notification, and email paths so they agree on
/// what counts as actionable.
pub fn due_alert(due_date: NaiveDate, today: NaiveDate) -> Option<&'static str> {
    if due_date == today {
        Some("Due Today")
    } else if due_date < today {
        Some("Overdue")
    } else {
        None
    }
}

// ─── Study plan ───────────────────────────────────────────────────────────────

/// One row of the ranked study plan. Priority and difficulty carry their
/// display labels here — raw integers belong to task payloads, not plan
/// output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanEntry {
    pub title:          String,
    pub description:    String,
    pub due_date:       NaiveDate,
    pub priority:       &'static str,
    pub difficulty:     &'static str,
    pub estimated_time: i64,
    pub status:         String,
}

/// Rank incomplete tasks into a study plan.
///
/// Callers filter out completed tasks before handing them over; this
/// function does not filter. Order: due date ascending, then priority
/// (High first), then difficulty with Hard first so the hardest material
/// gets tackled earliest. Ties keep input order (stable sort).
pub fn build_plan(tasks: &[Task], today: NaiveDate) -> Vec<PlanEntry> {
    debug_assert!(
        tasks.iter().all(|t| !t.completed),
        "build_plan expects pre-filtered incomplete tasks"
    );

    let mut ranked: Vec<&Task> = tasks.iter().collect();
    ranked.sort_by(|a, b| {
        a.due_date.cmp(&b.due_date)
            .then(a.priority.cmp(&b.priority))
            .then(b.difficulty.cmp(&a.difficulty))
    });

    ranked.into_iter().map(|t| PlanEntry {
        title:          t.title.clone(),
        description:    t.description.clone(),
        due_date:       t.due_date,
        priority:       t.priority.label(),
        difficulty:     t.difficulty.label(),
        estimated_time: t.estimated_time,
        status:         plan_status(t.due_date, today),
    }).collect()
}

/// Countdown text for the plan view. Narrower vocabulary than [`Status`]:
/// the plan only ever sees incomplete tasks, so "Completed" cannot occur.
fn plan_status(due_date: NaiveDate, today: NaiveDate) -> String {
    match due_alert(due_date, today) {
        Some(text) => text.to_owned(),
        None       => format!("{} days left", (due_date - today).num_days()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn due_alert_only_fires_on_or_after_due() {
        let today = d(2024, 3, 10);
        assert_eq!(due_alert(d(2024, 3, 10), today), Some("Due Today"));
        assert_eq!(due_alert(d(2024, 3, 9),  today), Some("Overdue"));
        assert_eq!(due_alert(d(2024, 3, 11), today), None);
    }

    #[test]
    fn plan_status_counts_whole_days() {
        let today = d(2024, 3, 10);
        assert_eq!(plan_status(d(2024, 3, 11), today), "1 days left");
        assert_eq!(plan_status(d(2024, 4, 9),  today), "30 days left");
    }
}
