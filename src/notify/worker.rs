//! Background notifier — Tokio task that emails due-date alerts on a timer.

use chrono::Local;
use tokio::sync::mpsc;
use tokio::time::Duration;

use crate::db::Database;
use crate::notify::mailer::Mailer;

pub const DEFAULT_INTERVAL_SECONDS: u64 = 86_400;

#[derive(Debug)]
pub enum NotifyCommand {
    RunNow,
    Shutdown,
}

// ─── Worker handle ────────────────────────────────────────────────────────────

pub struct NotifyWorker {
    cmd_tx: mpsc::Sender<NotifyCommand>,
}

impl NotifyWorker {
    /// Spawn the background worker. `interval_seconds` controls how often a
    /// full alert cycle runs; the first tick is discarded so startup never
    /// spams every user at once.
    pub fn spawn(db: Database, mailer: Mailer, interval_seconds: u64) -> Self {
        let (cmd_tx, mut cmd_rx) = mpsc::channel::<NotifyCommand>(16);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));
            interval.tick().await; // discard first immediate tick

            loop {
                tokio::select! {
                    cmd = cmd_rx.recv() => match cmd {
                        Some(NotifyCommand::Shutdown) | None => break,
                        Some(NotifyCommand::RunNow) => {
                            let today = Local::now().date_naive();
                            super::run_cycle(&db, &mailer, today).await;
                        }
                    },
                    _ = interval.tick() => {
                        let today = Local::now().date_naive();
                        super::run_cycle(&db, &mailer, today).await;
                    }
                }
            }

            tracing::info!("Notify worker stopped");
        });

        NotifyWorker { cmd_tx }
    }

    pub async fn run_now(&self)  { let _ = self.cmd_tx.send(NotifyCommand::RunNow).await; }
    pub async fn shutdown(&self) { let _ = self.cmd_tx.send(NotifyCommand::Shutdown).await; }
}
