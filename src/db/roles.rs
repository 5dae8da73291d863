use sqlx::PgPool;

use crate::models::Role;

pub const DEFAULT_ROLE: &str = "user";

/// Insert the built-in roles if they are absent. Idempotent; runs at startup.
pub async fn seed_defaults(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO roles (name) VALUES ('admin'), ('user') ON CONFLICT (name) DO NOTHING")
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}
