use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::comment::CommentWithAuthor;
use crate::models::project::ProjectBrief;
use crate::models::tag::Tag;
use crate::models::user::UserPublic;

/// Canonical task status, stored as a Postgres enum and serialized as
/// snake_case end-to-end. No alternate client-side vocabulary exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Summary fields embedded in project listings.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct TaskSummary {
    pub id: i64,
    pub title: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
}

/// Full task shape with all relations attached.
#[derive(Debug, Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectBrief>,
    pub assignees: Vec<UserPublic>,
    pub tags: Vec<Tag>,
    pub comments: Vec<CommentWithAuthor>,
}
