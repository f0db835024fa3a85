pub mod mailer;
pub mod worker;

use anyhow::Result;
use chrono::NaiveDate;

use crate::db::{Database, User};
use crate::notify::mailer::{DeliveryReport, Mailer};
use crate::tasks::due_alert;

/// Email every due/overdue alert for one user. Failures are collected per
/// message — a bounced mail never aborts the rest of the batch.
pub async fn send_user_alerts(
    db: &Database, mailer: &Mailer, user: &User, recipient: &str, today: NaiveDate,
) -> Result<DeliveryReport> {
    let tasks = db.incomplete_tasks_for_user(&user.id).await?;
    let mut report = DeliveryReport::default();

    for task in &tasks {
        let Some(status) = due_alert(task.due_date, today) else {
            continue;
        };
        match mailer.send_task_alert(recipient, &user.username, task, status).await {
            Ok(())  => report.sent += 1,
            Err(e)  => {
                tracing::warn!("alert mail failed for task {}: {e}", task.id);
                report.errors.push(e.to_string());
            }
        }
    }
    Ok(report)
}

/// One full alert cycle over every user that has an email address on file.
/// Returns (sent, failed) totals for logging.
pub async fn run_cycle(db: &Database, mailer: &Mailer, today: NaiveDate) -> (usize, usize) {
    let users = match db.users_with_email().await {
        Ok(u)  => u,
        Err(e) => {
            tracing::error!("users_with_email: {e}");
            return (0, 0);
        }
    };

    let mut sent   = 0usize;
    let mut failed = 0usize;

    for user in &users {
        let Some(recipient) = user.email.as_deref() else { continue };
        match send_user_alerts(db, mailer, user, recipient, today).await {
            Ok(report) => {
                sent   += report.sent;
                failed += report.errors.len();
            }
            Err(e) => {
                tracing::warn!("alerts for {} skipped: {e}", user.username);
                failed += 1;
            }
        }
    }

    tracing::info!("alert cycle done: sent={sent} failed={failed}");
    (sent, failed)
}
