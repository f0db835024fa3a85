use chrono::{NaiveDate, Utc};
use studyplanner::db::{Difficulty, Priority, Task};
use studyplanner::tasks::build_plan;
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn task(title: &str, due: NaiveDate, priority: i64, difficulty: i64) -> Task {
    Task {
        id:             Uuid::new_v4().to_string(),
        user_id:        "u1".to_owned(),
        title:          title.to_owned(),
        description:    String::new(),
        due_date:       due,
        priority:       Priority::try_from(priority).unwrap(),
        difficulty:     Difficulty::try_from(difficulty).unwrap(),
        estimated_time: 1,
        completed:      false,
        created_at:     Utc::now(),
    }
}

#[test]
fn priority_breaks_due_date_tie() {
    let due   = date(2024, 1, 10);
    let today = date(2024, 1, 5);
    let tasks = vec![
        task("medium-hard", due, 2, 3),
        task("high-easy",   due, 1, 1),
    ];

    let plan = build_plan(&tasks, today);
    assert_eq!(plan[0].title, "high-easy");
    assert_eq!(plan[1].title, "medium-hard");
    assert_eq!(plan[0].status, "5 days left");
    assert_eq!(plan[1].status, "5 days left");
}

#[test]
fn harder_tasks_surface_first_on_full_tie() {
    let due   = date(2024, 1, 10);
    let today = date(2024, 1, 5);
    let tasks = vec![
        task("easy", due, 2, 1),
        task("hard", due, 2, 3),
    ];

    let plan = build_plan(&tasks, today);
    assert_eq!(plan[0].title, "hard");
    assert_eq!(plan[1].title, "easy");
}

#[test]
fn earlier_due_dates_come_first() {
    let today = date(2024, 1, 5);
    let tasks = vec![
        task("later",  date(2024, 1, 20), 1, 3),
        task("sooner", date(2024, 1, 6),  3, 1),
    ];

    let plan = build_plan(&tasks, today);
    assert_eq!(plan[0].title, "sooner");
    assert_eq!(plan[1].title, "later");
}

#[test]
fn no_tasks_dropped_or_duplicated() {
    let today = date(2024, 1, 5);
    let tasks: Vec<Task> = (0..20)
        .map(|i| task(&format!("t{i}"), date(2024, 1, 1 + (i % 10)), 1 + (i % 3) as i64, 1 + ((i / 3) % 3) as i64))
        .collect();

    let plan = build_plan(&tasks, today);
    assert_eq!(plan.len(), tasks.len());

    let mut titles: Vec<&str> = plan.iter().map(|e| e.title.as_str()).collect();
    titles.sort_unstable();
    titles.dedup();
    assert_eq!(titles.len(), tasks.len());
}

#[test]
fn ordering_is_a_valid_three_key_sort() {
    let today = date(2024, 1, 5);
    let tasks: Vec<Task> = (0..30)
        .map(|i| task(&format!("t{i}"), date(2024, 1, 1 + (i * 7 % 15)), 1 + (i % 3) as i64, 1 + (i * 2 % 3) as i64))
        .collect();

    let plan = build_plan(&tasks, today);
    for pair in plan.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let pri = |label: &str| match label { "High" => 1, "Medium" => 2, _ => 3 };
        let dif = |label: &str| match label { "Easy" => 1, "Medium" => 2, _ => 3 };

        let ok = a.due_date < b.due_date
            || (a.due_date == b.due_date && pri(a.priority) < pri(b.priority))
            || (a.due_date == b.due_date
                && pri(a.priority) == pri(b.priority)
                && dif(a.difficulty) >= dif(b.difficulty));
        assert!(ok, "bad order: {a:?} before {b:?}");
    }
}

#[test]
fn ties_preserve_input_order() {
    let due   = date(2024, 1, 10);
    let today = date(2024, 1, 5);
    let tasks = vec![
        task("first",  due, 2, 2),
        task("second", due, 2, 2),
        task("third",  due, 2, 2),
    ];

    let plan = build_plan(&tasks, today);
    let titles: Vec<&str> = plan.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["first", "second", "third"]);
}

#[test]
fn build_plan_is_idempotent() {
    let today = date(2024, 1, 5);
    let tasks = vec![
        task("a", date(2024, 1, 10), 2, 3),
        task("b", date(2024, 1, 4),  1, 1),
        task("c", date(2024, 1, 5),  3, 2),
    ];

    assert_eq!(build_plan(&tasks, today), build_plan(&tasks, today));
}

#[test]
fn plan_status_uses_the_countdown_vocabulary() {
    let today = date(2024, 1, 5);
    let tasks = vec![
        task("today",     today,             1, 1),
        task("yesterday", date(2024, 1, 4),  1, 1),
        task("tomorrow",  date(2024, 1, 6),  1, 1),
    ];

    let plan = build_plan(&tasks, today);
    let status_of = |title: &str| {
        plan.iter().find(|e| e.title == title).unwrap().status.clone()
    };
    assert_eq!(status_of("today"), "Due Today");
    assert_eq!(status_of("yesterday"), "Overdue");
    assert_eq!(status_of("tomorrow"), "1 days left");
}

#[test]
fn plan_entries_carry_display_labels() {
    let today = date(2024, 1, 5);
    let plan = build_plan(&[task("t", date(2024, 1, 10), 1, 3)], today);
    assert_eq!(plan[0].priority, "High");
    assert_eq!(plan[0].difficulty, "Hard");
}
