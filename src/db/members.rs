use std::collections::HashMap;

use sqlx::PgPool;

use crate::models::MemberInfo;

pub async fn insert<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    project_id: i64,
    user_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO project_members (project_id, user_id) VALUES ($1, $2)")
        .bind(project_id)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, project_id: i64, user_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM project_members WHERE project_id = $1 AND user_id = $2",
    )
    .bind(project_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn is_member(pool: &PgPool, project_id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM project_members WHERE project_id = $1 AND user_id = $2)",
    )
    .bind(project_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

pub async fn member_ids(pool: &PgPool, project_id: i64) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT user_id FROM project_members WHERE project_id = $1")
        .bind(project_id)
        .fetch_all(pool)
        .await
}

pub async fn list_for_project(
    pool: &PgPool,
    project_id: i64,
) -> Result<Vec<MemberInfo>, sqlx::Error> {
    sqlx::query_as::<_, MemberInfo>(
        "SELECT u.id, u.username, u.email, pm.joined_at
         FROM project_members pm JOIN users u ON u.id = pm.user_id
         WHERE pm.project_id = $1
         ORDER BY pm.joined_at",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

#[derive(Debug, sqlx::FromRow)]
struct MemberRow {
    project_id: i64,
    id: i64,
    username: String,
    email: String,
    joined_at: chrono::DateTime<chrono::Utc>,
}

/// Batch variant for project listings: members grouped by project id.
pub async fn members_by_project(
    pool: &PgPool,
    project_ids: &[i64],
) -> Result<HashMap<i64, Vec<MemberInfo>>, sqlx::Error> {
    let rows: Vec<MemberRow> = sqlx::query_as(
        "SELECT pm.project_id, u.id, u.username, u.email, pm.joined_at
         FROM project_members pm JOIN users u ON u.id = pm.user_id
         WHERE pm.project_id = ANY($1)
         ORDER BY pm.joined_at",
    )
    .bind(project_ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<i64, Vec<MemberInfo>> = HashMap::new();
    for row in rows {
        grouped.entry(row.project_id).or_default().push(MemberInfo {
            id: row.id,
            username: row.username,
            email: row.email,
            joined_at: row.joined_at,
        });
    }
    Ok(grouped)
}
