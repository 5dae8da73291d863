use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::task::{Task, TaskSummary};
use crate::models::user::UserPublic;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Minimal project reference embedded in cross-project task listings.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ProjectBrief {
    pub id: i64,
    pub name: String,
}

/// Project member with the timestamp from the join table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct MemberInfo {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub joined_at: DateTime<Utc>,
}

/// List-view shape: project with owner, members, and task summary fields.
#[derive(Debug, Serialize)]
pub struct ProjectSummary {
    #[serde(flatten)]
    pub project: Project,
    pub owner: UserPublic,
    pub members: Vec<MemberInfo>,
    pub tasks: Vec<TaskSummary>,
}

/// Detail-view shape: full nested task list with assignees.
#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub owner: UserPublic,
    pub members: Vec<MemberInfo>,
    pub tasks: Vec<TaskWithAssignees>,
}

#[derive(Debug, Serialize)]
pub struct TaskWithAssignees {
    #[serde(flatten)]
    pub task: Task,
    pub assignees: Vec<UserPublic>,
}
