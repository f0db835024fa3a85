use anyhow::Result;
use chrono::Local;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studyplanner::config::AppConfig;
use studyplanner::db::Database;
use studyplanner::http::{self, AppState};
use studyplanner::notify::{self, mailer::Mailer, worker::NotifyWorker};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    // ── sp notify ─────────────────────────────────────────────────────────────
    if args.get(1).map(|s| s.as_str()) == Some("notify") {
        return cmd_notify().await;
    }

    // ── sp [serve] ────────────────────────────────────────────────────────────
    run_server().await
}

// ─── One-shot alert run ───────────────────────────────────────────────────────

async fn cmd_notify() -> Result<()> {
    // Logging to stderr so output reads like a normal CLI run
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cfg = AppConfig::load()?;
    let Some(mail) = cfg.mail else {
        println!("No [mail] section found in config.toml — email alerts are disabled.");
        return Ok(());
    };

    let db = Database::connect().await?;
    db.migrate().await?;

    let mailer = Mailer::new(mail);
    let today  = Local::now().date_naive();
    let (sent, failed) = notify::run_cycle(&db, &mailer, today).await;

    println!("Alert run complete: {sent} sent, {failed} failed.");
    Ok(())
}

// ─── Server ──────────────────────────────────────────────────────────────────

async fn run_server() -> Result<()> {
    let log_dir = dirs::data_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("studyplanner");
    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "studyplanner.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
        .init();

    tracing::info!("Starting Study Planner");

    let cfg = AppConfig::load().unwrap_or_default();
    let db  = Database::connect().await?;
    db.migrate().await?;

    let mailer = cfg.mail.clone().map(Mailer::new);

    // Background alert worker only makes sense with a mail gateway configured
    let _worker = match &mailer {
        Some(m) => {
            let auto = cfg.notify.as_ref().and_then(|n| n.auto_notify).unwrap_or(true);
            if auto {
                let interval = cfg.notify.as_ref()
                    .and_then(|n| n.interval_seconds)
                    .unwrap_or(studyplanner::notify::worker::DEFAULT_INTERVAL_SECONDS);
                Some(NotifyWorker::spawn(db.clone(), m.clone(), interval))
            } else {
                None
            }
        }
        None => None,
    };

    let state = AppState { db, mailer };
    http::serve(&cfg.bind_addr(), state).await
}
