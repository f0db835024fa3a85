use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePool, Row};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

// ─── Closed enumerations ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
#[error("value {0} is outside the allowed 1-3 range")]
pub struct OutOfRange(pub i64);

/// Task priority. Lower value = more urgent; derived `Ord` follows the
/// declaration order, so `High < Medium < Low` matches the numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::High   => "High",
            Priority::Medium => "Medium",
            Priority::Low    => "Low",
        }
    }
}

impl TryFrom<i64> for Priority {
    type Error = OutOfRange;
    fn try_from(v: i64) -> Result<Self, OutOfRange> {
        match v {
            1 => Ok(Priority::High),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::Low),
            other => Err(OutOfRange(other)),
        }
    }
}

impl From<Priority> for i64 {
    fn from(p: Priority) -> i64 {
        match p {
            Priority::High   => 1,
            Priority::Medium => 2,
            Priority::Low    => 3,
        }
    }
}

/// Task difficulty. Numeric codes grow with difficulty, so the derived
/// `Ord` puts `Easy < Medium < Hard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy   => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard   => "Hard",
        }
    }
}

impl TryFrom<i64> for Difficulty {
    type Error = OutOfRange;
    fn try_from(v: i64) -> Result<Self, OutOfRange> {
        match v {
            1 => Ok(Difficulty::Easy),
            2 => Ok(Difficulty::Medium),
            3 => Ok(Difficulty::Hard),
            other => Err(OutOfRange(other)),
        }
    }
}

impl From<Difficulty> for i64 {
    fn from(d: Difficulty) -> i64 {
        match d {
            Difficulty::Easy   => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard   => 3,
        }
    }
}

// ─── Domain models ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub priority: Priority,
    pub difficulty: Difficulty,
    pub estimated_time: i64,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Mutable task fields, validated at the HTTP boundary before they reach
/// this layer. Everything except id, owner, and created_at.
#[derive(Debug, Clone)]
pub struct TaskFields {
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub priority: Priority,
    pub difficulty: Difficulty,
    pub estimated_time: i64,
    pub completed: bool,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ─── Database ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect() -> Result<Self> {
        let db_path = data_dir().join("studyplanner.db");
        Self::open(&db_path).await
    }

    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        Ok(Self { pool: SqlitePool::connect(&url).await? })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY, username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL, email TEXT,
                created_at TEXT NOT NULL
            )"
        ).execute(&self.pool).await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS api_tokens (
                token TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL
            )"
        ).execute(&self.pool).await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title TEXT NOT NULL, description TEXT NOT NULL DEFAULT '',
                due_date TEXT NOT NULL,
                priority INTEGER NOT NULL DEFAULT 2,
                difficulty INTEGER NOT NULL DEFAULT 2,
                estimated_time INTEGER NOT NULL DEFAULT 1,
                completed INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )"
        ).execute(&self.pool).await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_tasks_user_due ON tasks(user_id, due_date)")
            .execute(&self.pool).await?;

        tracing::info!("DB migrations complete");
        Ok(())
    }

    // ── Users ─────────────────────────────────────────────────────────────────

    pub async fn create_user(
        &self, username: &str, password_hash: &str, email: Option<&str>,
    ) -> Result<User> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_owned(),
            password_hash: password_hash.to_owned(),
            email: email.map(str::to_owned),
            created_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO users (id,username,password_hash,email,created_at) VALUES (?,?,?,?,?)"
        )
        .bind(&user.id).bind(&user.username).bind(&user.password_hash)
        .bind(&user.email).bind(user.created_at.to_rfc3339())
        .execute(&self.pool).await?;
        Ok(user)
    }

    pub async fn user_by_name(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username=?")
            .bind(username).fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_user).transpose()
    }

    pub async fn users_with_email(&self) -> Result<Vec<User>> {
        let rows = sqlx::query("SELECT * FROM users WHERE email IS NOT NULL ORDER BY username")
            .fetch_all(&self.pool).await?;
        rows.iter().map(row_to_user).collect()
    }

    // ── API tokens ────────────────────────────────────────────────────────────

    pub async fn insert_token(&self, user_id: &str, token: &str) -> Result<()> {
        sqlx::query("INSERT INTO api_tokens (token,user_id,created_at) VALUES (?,?,?)")
            .bind(token).bind(user_id).bind(Utc::now().to_rfc3339())
            .execute(&self.pool).await?;
        Ok(())
    }

    pub async fn user_by_token(&self, token: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT u.* FROM users u JOIN api_tokens t ON t.user_id = u.id WHERE t.token=?"
        )
        .bind(token).fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_user).transpose()
    }

    /// Returns false if the token did not exist (already revoked or bogus).
    pub async fn revoke_token(&self, token: &str) -> Result<bool> {
        let done = sqlx::query("DELETE FROM api_tokens WHERE token=?")
            .bind(token).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    // ── Tasks ─────────────────────────────────────────────────────────────────

    pub async fn tasks_for_user(&self, user_id: &str) -> Result<Vec<Task>> {
        let rows = sqlx::query(
            "SELECT * FROM tasks WHERE user_id=? ORDER BY due_date, created_at"
        )
        .bind(user_id).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_task).collect()
    }

    pub async fn incomplete_tasks_for_user(&self, user_id: &str) -> Result<Vec<Task>> {
        let rows = sqlx::query(
            "SELECT * FROM tasks WHERE user_id=? AND completed=0 ORDER BY due_date, created_at"
        )
        .bind(user_id).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_task).collect()
    }

    pub async fn create_task(&self, user_id: &str, fields: &TaskFields) -> Result<Task> {
        let task = Task {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_owned(),
            title: fields.title.clone(),
            description: fields.description.clone(),
            due_date: fields.due_date,
            priority: fields.priority,
            difficulty: fields.difficulty,
            estimated_time: fields.estimated_time,
            completed: fields.completed,
            created_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO tasks
                (id,user_id,title,description,due_date,priority,difficulty,
                 estimated_time,completed,created_at)
             VALUES (?,?,?,?,?,?,?,?,?,?)"
        )
        .bind(&task.id).bind(&task.user_id).bind(&task.title).bind(&task.description)
        .bind(task.due_date.format("%Y-%m-%d").to_string())
        .bind(i64::from(task.priority)).bind(i64::from(task.difficulty))
        .bind(task.estimated_time).bind(task.completed as i32)
        .bind(task.created_at.to_rfc3339())
        .execute(&self.pool).await?;
        Ok(task)
    }

    /// Full replacement of the mutable fields. Returns `None` when the task
    /// does not exist or belongs to another user — ownership is part of the
    /// WHERE clause, never inferred.
    pub async fn update_task(
        &self, task_id: &str, user_id: &str, fields: &TaskFields,
    ) -> Result<Option<Task>> {
        let done = sqlx::query(
            "UPDATE tasks SET
                title=?, description=?, due_date=?, priority=?, difficulty=?,
                estimated_time=?, completed=?
             WHERE id=? AND user_id=?"
        )
        .bind(&fields.title).bind(&fields.description)
        .bind(fields.due_date.format("%Y-%m-%d").to_string())
        .bind(i64::from(fields.priority)).bind(i64::from(fields.difficulty))
        .bind(fields.estimated_time).bind(fields.completed as i32)
        .bind(task_id).bind(user_id)
        .execute(&self.pool).await?;

        if done.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_task(task_id, user_id).await
    }

    pub async fn get_task(&self, task_id: &str, user_id: &str) -> Result<Option<Task>> {
        let row = sqlx::query("SELECT * FROM tasks WHERE id=? AND user_id=?")
            .bind(task_id).bind(user_id).fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_task).transpose()
    }

    /// Returns false when the task does not exist or is not owned by the user.
    pub async fn delete_task(&self, task_id: &str, user_id: &str) -> Result<bool> {
        let done = sqlx::query("DELETE FROM tasks WHERE id=? AND user_id=?")
            .bind(task_id).bind(user_id)
            .execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> Result<Task> {
    Ok(Task {
        id:             row.get("id"),
        user_id:        row.get("user_id"),
        title:          row.get("title"),
        description:    row.get("description"),
        due_date:       parse_date(row.get("due_date"))?,
        priority:       Priority::try_from(row.get::<i64, _>("priority"))?,
        difficulty:     Difficulty::try_from(row.get::<i64, _>("difficulty"))?,
        estimated_time: row.get("estimated_time"),
        completed:      row.get::<i32, _>("completed") != 0,
        created_at:     parse_dt(row.get("created_at"))?,
    })
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    Ok(User {
        id:            row.get("id"),
        username:      row.get("username"),
        password_hash: row.get("password_hash"),
        email:         row.get("email"),
        created_at:    parse_dt(row.get("created_at"))?,
    })
}

fn parse_date(s: String) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(&s, "%Y-%m-%d")?)
}

fn parse_dt(s: String) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(&s)?.with_timezone(&Utc))
}

fn data_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("studyplanner")
}
