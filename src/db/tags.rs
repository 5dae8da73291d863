use sqlx::PgPool;

use crate::models::Tag;

pub const DEFAULT_COLOR: &str = "#6B7280";

pub async fn list(pool: &PgPool) -> Result<Vec<Tag>, sqlx::Error> {
    sqlx::query_as::<_, Tag>("SELECT * FROM tags ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Tag>, sqlx::Error> {
    sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Case-sensitive name lookup, optionally excluding one tag id (used by
/// update so a tag does not conflict with itself).
pub async fn find_by_name_excluding(
    pool: &PgPool,
    name: &str,
    exclude_id: Option<i64>,
) -> Result<Option<Tag>, sqlx::Error> {
    sqlx::query_as::<_, Tag>(
        "SELECT * FROM tags WHERE name = $1 AND ($2::bigint IS NULL OR id <> $2)",
    )
    .bind(name)
    .bind(exclude_id)
    .fetch_optional(pool)
    .await
}

pub async fn insert(pool: &PgPool, name: &str, color: &str) -> Result<Tag, sqlx::Error> {
    sqlx::query_as::<_, Tag>("INSERT INTO tags (name, color) VALUES ($1, $2) RETURNING *")
        .bind(name)
        .bind(color)
        .fetch_one(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    name: Option<&str>,
    color: Option<&str>,
) -> Result<Option<Tag>, sqlx::Error> {
    sqlx::query_as::<_, Tag>(
        "UPDATE tags SET name = COALESCE($2, name), color = COALESCE($3, color)
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(color)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tags WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn in_use(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM task_tags WHERE tag_id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}
