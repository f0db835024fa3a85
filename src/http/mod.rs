//! HTTP API: token-authenticated task CRUD, the ranked study plan, and the
//! reminder/notification/email alert views.
//!
//! Every handler resolves `today` exactly once and threads it into the core
//! as an explicit parameter. Payloads are validated into typed fields here,
//! before any task logic runs — out-of-range enum codes are rejected with a
//! field-level error map, never coerced.

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::auth::{self, AuthUser};
use crate::db::{Database, Difficulty, Priority, Task, TaskFields};
use crate::notify::{self, mailer::Mailer};
use crate::tasks::{build_plan, due_alert};

// ─── State & errors ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub db:     Database,
    pub mailer: Option<Mailer>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(BTreeMap<&'static str, String>),
    #[error("invalid or missing credentials")]
    Auth,
    #[error("task not found")]
    NotFound,
    #[error("mail gateway not configured")]
    MailNotConfigured,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "errors": fields })),
            ).into_response(),
            ApiError::Auth => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid or missing credentials" })),
            ).into_response(),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Task not found" })),
            ).into_response(),
            ApiError::MailNotConfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": "Mail gateway not configured" })),
            ).into_response(),
            ApiError::Internal(e) => {
                tracing::error!("internal error: {e:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                ).into_response()
            }
        }
    }
}

// ─── Router ───────────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/signup", post(signup))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/tasks", get(tasks_list))
        .route("/tasks/create", post(create_task))
        .route("/tasks/update/{id}", put(update_task))
        .route("/tasks/delete/{id}", delete(delete_task))
        .route("/studyplan", get(study_plan))
        .route("/reminders", get(reminders))
        .route("/notifications", get(notifications))
        .route("/send-email-notifications", get(send_email_notifications))
        .with_state(state)
}

pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

// ─── Auth handlers ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CredentialsPayload {
    username: Option<String>,
    password: Option<String>,
    email:    Option<String>,
}

async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut errors = BTreeMap::new();
    let username = payload.username.as_deref().map(str::trim).unwrap_or_default();
    let password = payload.password.as_deref().unwrap_or_default();
    if username.is_empty() {
        errors.insert("username", "This field is required.".to_owned());
    }
    if password.is_empty() {
        errors.insert("password", "This field is required.".to_owned());
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    if state.db.user_by_name(username).await?.is_some() {
        errors.insert("username", "Username already exists.".to_owned());
        return Err(ApiError::Validation(errors));
    }

    let hash = auth::hash_password(password);
    let user = state.db.create_user(username, &hash, payload.email.as_deref()).await?;
    let token = auth::generate_token();
    state.db.insert_token(&user.id, &token).await?;

    tracing::info!("user {} signed up", user.username);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created successfully", "token": token })),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let username = payload.username.as_deref().map(str::trim).unwrap_or_default();
    let password = payload.password.as_deref().unwrap_or_default();

    let user = state.db.user_by_name(username).await?.ok_or(ApiError::Auth)?;
    if !auth::verify_password(password, &user.password_hash) {
        return Err(ApiError::Auth);
    }

    let token = auth::generate_token();
    state.db.insert_token(&user.id, &token).await?;
    Ok(Json(json!({ "message": "Login successful", "token": token })))
}

async fn logout(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    state.db.revoke_token(&caller.token).await?;
    Ok(Json(json!({ "message": "Logged out successfully" })))
}

// ─── Task payloads & views ────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct TaskPayload {
    pub title:          Option<String>,
    pub description:    Option<String>,
    pub due_date:       Option<String>,
    pub priority:       Option<i64>,
    pub difficulty:     Option<i64>,
    pub estimated_time: Option<i64>,
    pub completed:      Option<bool>,
}

impl TaskPayload {
    /// Validate into typed fields, collecting every field error instead of
    /// stopping at the first one. Omitted priority/difficulty/estimated_time
    /// fall back to their documented defaults (Medium, Medium, 1 hour).
    pub fn validate(self) -> Result<TaskFields, ApiError> {
        let mut errors: BTreeMap<&'static str, String> = BTreeMap::new();

        let title = self.title
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty());
        if title.is_none() {
            errors.insert("title", "This field is required.".to_owned());
        }

        // Empty description is fine — absent is not.
        let description = match self.description {
            Some(d) => d,
            None => {
                errors.insert("description", "This field is required.".to_owned());
                String::new()
            }
        };

        let due_date = match self.due_date.as_deref() {
            Some(s) => match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                Ok(d) => Some(d),
                Err(_) => {
                    errors.insert("due_date", "Expected a date in YYYY-MM-DD format.".to_owned());
                    None
                }
            },
            None => {
                errors.insert("due_date", "This field is required.".to_owned());
                None
            }
        };

        let priority = match Priority::try_from(self.priority.unwrap_or(2)) {
            Ok(p) => p,
            Err(e) => {
                errors.insert("priority", e.to_string());
                Priority::Medium
            }
        };

        let difficulty = match Difficulty::try_from(self.difficulty.unwrap_or(2)) {
            Ok(d) => d,
            Err(e) => {
                errors.insert("difficulty", e.to_string());
                Difficulty::Medium
            }
        };

        let estimated_time = self.estimated_time.unwrap_or(1);
        if estimated_time < 1 {
            errors.insert("estimated_time", "Must be a positive number of hours.".to_owned());
        }

        match (title, due_date) {
            (Some(title), Some(due_date)) if errors.is_empty() => Ok(TaskFields {
                title,
                description,
                due_date,
                priority,
                difficulty,
                estimated_time,
                completed: self.completed.unwrap_or(false),
            }),
            _ => Err(ApiError::Validation(errors)),
        }
    }
}

/// Task record as served over the wire: raw enum codes plus the derived
/// four-state status — including "Completed", which listings must never
/// drop for finished tasks.
#[derive(Debug, Serialize)]
struct TaskView {
    id:             String,
    title:          String,
    description:    String,
    due_date:       NaiveDate,
    priority:       Priority,
    difficulty:     Difficulty,
    estimated_time: i64,
    completed:      bool,
    status:         &'static str,
}

impl TaskView {
    fn new(t: &Task, today: NaiveDate) -> Self {
        Self {
            id:             t.id.clone(),
            title:          t.title.clone(),
            description:    t.description.clone(),
            due_date:       t.due_date,
            priority:       t.priority,
            difficulty:     t.difficulty,
            estimated_time: t.estimated_time,
            completed:      t.completed,
            status:         t.status_on(today).as_str(),
        }
    }
}

/// Reminder row: display labels and the two-state alert vocabulary, distinct
/// from both the record status and the plan countdown.
#[derive(Debug, Serialize)]
struct ReminderEntry {
    title:          String,
    description:    String,
    due_date:       NaiveDate,
    priority:       &'static str,
    difficulty:     &'static str,
    estimated_time: i64,
    status:         &'static str,
}

// ─── Task handlers ────────────────────────────────────────────────────────────

async fn tasks_list(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let today = Local::now().date_naive();
    let tasks = state.db.tasks_for_user(&caller.user.id).await?;
    let views: Vec<TaskView> = tasks.iter().map(|t| TaskView::new(t, today)).collect();
    Ok(Json(views))
}

async fn create_task(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(payload): Json<TaskPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = payload.validate()?;
    let task = state.db.create_task(&caller.user.id, &fields).await?;
    let today = Local::now().date_naive();
    Ok((StatusCode::CREATED, Json(TaskView::new(&task, today))))
}

async fn update_task(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(task_id): Path<String>,
    Json(payload): Json<TaskPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = payload.validate()?;
    let task = state.db.update_task(&task_id, &caller.user.id, &fields).await?
        .ok_or(ApiError::NotFound)?;
    let today = Local::now().date_naive();
    Ok(Json(TaskView::new(&task, today)))
}

async fn delete_task(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(task_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.db.delete_task(&task_id, &caller.user.id).await? {
        return Err(ApiError::NotFound);
    }
    Ok(Json(json!({ "message": "Task deleted successfully" })))
}

// ─── Plan, reminders, notifications ───────────────────────────────────────────

async fn study_plan(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let today = Local::now().date_naive();
    let tasks = state.db.incomplete_tasks_for_user(&caller.user.id).await?;
    Ok(Json(build_plan(&tasks, today)))
}

async fn reminders(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let today = Local::now().date_naive();
    let tasks = state.db.incomplete_tasks_for_user(&caller.user.id).await?;

    let entries: Vec<ReminderEntry> = tasks.iter()
        .filter_map(|t| due_alert(t.due_date, today).map(|status| ReminderEntry {
            title:          t.title.clone(),
            description:    t.description.clone(),
            due_date:       t.due_date,
            priority:       t.priority.label(),
            difficulty:     t.difficulty.label(),
            estimated_time: t.estimated_time,
            status,
        }))
        .collect();
    Ok(Json(entries))
}

async fn notifications(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let today = Local::now().date_naive();
    let tasks = state.db.incomplete_tasks_for_user(&caller.user.id).await?;

    let alerts: Vec<serde_json::Value> = tasks.iter()
        .filter_map(|t| due_alert(t.due_date, today).map(|status| json!({
            "id":     t.id,
            "title":  t.title,
            "status": status,
        })))
        .collect();
    Ok(Json(json!({ "alerts_count": alerts.len(), "alerts": alerts })))
}

async fn send_email_notifications(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Response, ApiError> {
    let Some(mailer) = &state.mailer else {
        return Err(ApiError::MailNotConfigured);
    };
    let Some(recipient) = caller.user.email.clone() else {
        let mut errors = BTreeMap::new();
        errors.insert("email", "No email address on this account.".to_owned());
        return Err(ApiError::Validation(errors));
    };

    let today = Local::now().date_naive();
    let report = notify::send_user_alerts(&state.db, mailer, &caller.user, &recipient, today).await?;

    if report.errors.is_empty() {
        Ok(Json(json!({
            "message":     "Email notifications sent successfully!",
            "emails_sent": report.sent,
        })).into_response())
    } else {
        Ok((
            StatusCode::MULTI_STATUS,
            Json(json!({
                "message": format!("Emails sent: {}, but some errors occurred.", report.sent),
                "errors":  report.errors,
            })),
        ).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(due: &str) -> TaskPayload {
        TaskPayload {
            title:       Some("Read chapter 4".to_owned()),
            description: Some(String::new()),
            due_date:    Some(due.to_owned()),
            ..TaskPayload::default()
        }
    }

    #[test]
    fn validate_applies_documented_defaults() {
        let fields = payload("2024-06-01").validate().unwrap();
        assert_eq!(fields.priority, Priority::Medium);
        assert_eq!(fields.difficulty, Difficulty::Medium);
        assert_eq!(fields.estimated_time, 1);
        assert!(!fields.completed);
    }

    #[test]
    fn validate_rejects_missing_required_fields() {
        let err = TaskPayload::default().validate().unwrap_err();
        let ApiError::Validation(errors) = err else { panic!("expected validation error") };
        assert!(errors.contains_key("title"));
        assert!(errors.contains_key("description"));
        assert!(errors.contains_key("due_date"));
    }

    #[test]
    fn validate_rejects_out_of_range_enums_without_coercing() {
        let mut p = payload("2024-06-01");
        p.priority = Some(0);
        p.difficulty = Some(9);
        let ApiError::Validation(errors) = p.validate().unwrap_err() else {
            panic!("expected validation error")
        };
        assert!(errors.contains_key("priority"));
        assert!(errors.contains_key("difficulty"));
    }

    #[test]
    fn validate_rejects_malformed_dates() {
        let ApiError::Validation(errors) = payload("01/06/2024").validate().unwrap_err() else {
            panic!("expected validation error")
        };
        assert!(errors.contains_key("due_date"));
    }

    #[test]
    fn validate_allows_empty_description() {
        assert!(payload("2024-06-01").validate().is_ok());
    }

    #[test]
    fn validate_rejects_non_positive_estimate() {
        let mut p = payload("2024-06-01");
        p.estimated_time = Some(0);
        assert!(matches!(p.validate(), Err(ApiError::Validation(_))));
    }
}
