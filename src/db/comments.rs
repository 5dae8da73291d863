use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::{Comment, CommentWithAuthor, UserPublic};

#[derive(Debug, sqlx::FromRow)]
struct CommentAuthorRow {
    id: i64,
    task_id: i64,
    content: String,
    created_at: DateTime<Utc>,
    user_id: i64,
    username: String,
    email: String,
}

impl From<CommentAuthorRow> for CommentWithAuthor {
    fn from(row: CommentAuthorRow) -> Self {
        CommentWithAuthor {
            id: row.id,
            task_id: row.task_id,
            content: row.content,
            created_at: row.created_at,
            user: UserPublic {
                id: row.user_id,
                username: row.username,
                email: row.email,
            },
        }
    }
}

pub async fn insert(
    pool: &PgPool,
    task_id: i64,
    user_id: i64,
    content: &str,
) -> Result<Comment, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        "INSERT INTO comments (task_id, user_id, content) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(task_id)
    .bind(user_id)
    .bind(content)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_with_author(
    pool: &PgPool,
    id: i64,
) -> Result<Option<CommentWithAuthor>, sqlx::Error> {
    let row: Option<CommentAuthorRow> = sqlx::query_as(
        "SELECT c.id, c.task_id, c.content, c.created_at, u.id AS user_id, u.username, u.email
         FROM comments c JOIN users u ON u.id = c.user_id
         WHERE c.id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(CommentWithAuthor::from))
}

/// Comments for one task, oldest first, authors attached.
pub async fn list_by_task(
    pool: &PgPool,
    task_id: i64,
) -> Result<Vec<CommentWithAuthor>, sqlx::Error> {
    let rows: Vec<CommentAuthorRow> = sqlx::query_as(
        "SELECT c.id, c.task_id, c.content, c.created_at, u.id AS user_id, u.username, u.email
         FROM comments c JOIN users u ON u.id = c.user_id
         WHERE c.task_id = $1
         ORDER BY c.created_at",
    )
    .bind(task_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(CommentWithAuthor::from).collect())
}

/// Batch variant for task listings: comments grouped by task id.
pub async fn comments_by_task(
    pool: &PgPool,
    task_ids: &[i64],
) -> Result<HashMap<i64, Vec<CommentWithAuthor>>, sqlx::Error> {
    let rows: Vec<CommentAuthorRow> = sqlx::query_as(
        "SELECT c.id, c.task_id, c.content, c.created_at, u.id AS user_id, u.username, u.email
         FROM comments c JOIN users u ON u.id = c.user_id
         WHERE c.task_id = ANY($1)
         ORDER BY c.created_at",
    )
    .bind(task_ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<i64, Vec<CommentWithAuthor>> = HashMap::new();
    for row in rows {
        grouped
            .entry(row.task_id)
            .or_default()
            .push(CommentWithAuthor::from(row));
    }
    Ok(grouped)
}

pub async fn update(pool: &PgPool, id: i64, content: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE comments SET content = $2 WHERE id = $1")
        .bind(id)
        .bind(content)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
