use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::user::UserPublic;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub task_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Comment with its author attached, as returned by every comment endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CommentWithAuthor {
    pub id: i64,
    pub task_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub user: UserPublic,
}
