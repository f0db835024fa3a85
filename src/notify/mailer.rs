//! Email delivery through an HTTP mail gateway.
//!
//! The gateway receives `{from, to, subject, text}` as JSON with a bearer
//! token — the shape most transactional-mail providers accept. SMTP is the
//! gateway's problem; this client only reports per-message success or
//! failure.

use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;

use crate::db::Task;

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub api_url:      String,
    pub api_token:    String,
    pub from_address: String,
}

/// Outcome of a batch of alert mails. Partial failure is a normal result
/// here, not an error: already-sent messages stay sent.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    pub sent:   usize,
    pub errors: Vec<String>,
}

#[derive(Clone)]
pub struct Mailer {
    http:   Client,
    config: MailConfig,
}

impl Mailer {
    pub fn new(config: MailConfig) -> Self {
        Self {
            http: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .user_agent("StudyPlanner/0.1")
                .build().expect("http client"),
            config,
        }
    }

    pub async fn send_task_alert(
        &self, to: &str, username: &str, task: &Task, status: &str,
    ) -> Result<()> {
        let subject = format!("📚 Task Alert: {}", task.title);
        let text = format!(
            "Hello {username},\n\n\
             This is a reminder from Study Planner.\n\n\
             Your task \"{}\" is {status}.\n\
             Due Date: {}\n\
             Priority: {}\n\n\
             Please complete it as soon as possible.\n\n\
             – Study Planner",
            task.title,
            task.due_date.format("%Y-%m-%d"),
            task.priority.label(),
        );

        self.http.post(&self.config.api_url)
            .bearer_auth(&self.config.api_token)
            .json(&serde_json::json!({
                "from":    self.config.from_address,
                "to":      to,
                "subject": subject,
                "text":    text,
            }))
            .send().await?
            .error_for_status()?;
        Ok(())
    }
}
