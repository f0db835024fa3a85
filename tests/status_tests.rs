use chrono::{Duration, NaiveDate};
use studyplanner::tasks::Status;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn completed_wins_regardless_of_due_date() {
    let today = date(2024, 1, 15);
    for due in [today - Duration::days(30), today, today + Duration::days(30)] {
        assert_eq!(Status::classify(true, due, today), Status::Completed);
    }
}

#[test]
fn incomplete_tasks_partition_by_due_date() {
    let today = date(2024, 1, 15);

    // Every incomplete task lands in exactly one of the three date states
    for offset in -400..=400 {
        let due = today + Duration::days(offset);
        let status = Status::classify(false, due, today);
        let expected = if offset < 0 {
            Status::Overdue
        } else if offset == 0 {
            Status::DueToday
        } else {
            Status::Pending
        };
        assert_eq!(status, expected, "offset {offset}");
    }
}

#[test]
fn due_today_when_dates_match() {
    let today = date(2024, 1, 15);
    assert_eq!(Status::classify(false, today, today), Status::DueToday);
}

#[test]
fn overdue_when_due_yesterday() {
    let today = date(2024, 1, 15);
    assert_eq!(
        Status::classify(false, today - Duration::days(1), today),
        Status::Overdue
    );
}

#[test]
fn completion_overrides_overdue() {
    let today = date(2024, 1, 15);
    assert_eq!(
        Status::classify(true, today - Duration::days(1), today),
        Status::Completed
    );
}

#[test]
fn display_strings_match_the_api_vocabulary() {
    assert_eq!(Status::Completed.to_string(), "Completed");
    assert_eq!(Status::Overdue.to_string(), "Overdue");
    assert_eq!(Status::DueToday.to_string(), "Due Today");
    assert_eq!(Status::Pending.to_string(), "Pending");
}
