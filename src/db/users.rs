use sqlx::PgPool;

use crate::models::{Role, User, UserProfile, UserPublic};

/// User row joined with its role name, used by the auth extractor.
#[derive(Debug, sqlx::FromRow)]
pub struct UserWithRole {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role_id: i64,
    pub role_name: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: i64,
    username: String,
    email: String,
    role_id: i64,
    role_name: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

pub async fn create(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
    role_id: i64,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (username, email, password_hash, role_id)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(role_id)
    .fetch_one(pool)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_with_role(pool: &PgPool, id: i64) -> Result<Option<UserWithRole>, sqlx::Error> {
    sqlx::query_as::<_, UserWithRole>(
        "SELECT u.id, u.username, u.email, u.role_id, r.name AS role_name
         FROM users u JOIN roles r ON r.id = u.role_id
         WHERE u.id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_profile(pool: &PgPool, id: i64) -> Result<Option<UserProfile>, sqlx::Error> {
    let row = sqlx::query_as::<_, ProfileRow>(
        "SELECT u.id, u.username, u.email, u.role_id, r.name AS role_name, u.created_at
         FROM users u JOIN roles r ON r.id = u.role_id
         WHERE u.id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| UserProfile {
        id: r.id,
        username: r.username,
        email: r.email,
        role: Role {
            id: r.role_id,
            name: r.role_name,
        },
        created_at: r.created_at,
    }))
}

pub async fn email_taken_by_other(
    pool: &PgPool,
    email: &str,
    user_id: i64,
) -> Result<bool, sqlx::Error> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND id <> $2)",
    )
    .bind(email)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

pub async fn update_profile(
    pool: &PgPool,
    id: i64,
    username: Option<&str>,
    email: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET username = COALESCE($2, username), email = COALESCE($3, email)
         WHERE id = $1",
    )
    .bind(id)
    .bind(username)
    .bind(email)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_password(
    pool: &PgPool,
    id: i64,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(())
}

/// Case-insensitive substring search over username/email, excluding users
/// who are already members of the project. Capped at 10 results.
pub async fn search_non_members(
    pool: &PgPool,
    project_id: i64,
    query: &str,
) -> Result<Vec<UserPublic>, sqlx::Error> {
    let pattern = format!("%{query}%");
    sqlx::query_as::<_, UserPublic>(
        "SELECT id, username, email FROM users
         WHERE (username ILIKE $2 OR email ILIKE $2)
           AND id NOT IN (SELECT user_id FROM project_members WHERE project_id = $1)
         ORDER BY username
         LIMIT 10",
    )
    .bind(project_id)
    .bind(pattern)
    .fetch_all(pool)
    .await
}
