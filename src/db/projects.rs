use std::collections::HashMap;

use sqlx::PgPool;

use crate::db;
use crate::models::{Project, ProjectSummary, TaskSummary, UserPublic};

pub async fn insert<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    name: &str,
    description: Option<&str>,
    owner_id: i64,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "INSERT INTO projects (name, description, owner_id) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(name)
    .bind(description)
    .bind(owner_id)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Projects where the user is the owner or a member, newest first.
pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "SELECT p.* FROM projects p
         WHERE p.owner_id = $1
            OR EXISTS(SELECT 1 FROM project_members pm
                      WHERE pm.project_id = p.id AND pm.user_id = $1)
         ORDER BY p.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    name: Option<&str>,
    description: Option<&str>,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects
         SET name = COALESCE($2, name), description = COALESCE($3, description)
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .fetch_optional(pool)
    .await
}

/// Dependent tasks, memberships, assignments and comments go with the
/// project via the schema's ON DELETE CASCADE.
pub async fn delete(pool: &PgPool, id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[derive(Debug, sqlx::FromRow)]
struct TaskSummaryRow {
    project_id: i64,
    id: i64,
    title: String,
    status: crate::models::TaskStatus,
    priority: crate::models::TaskPriority,
}

/// Attach owner, members and task summaries to a page of projects.
pub async fn attach_relations(
    pool: &PgPool,
    projects: Vec<Project>,
) -> Result<Vec<ProjectSummary>, sqlx::Error> {
    let project_ids: Vec<i64> = projects.iter().map(|p| p.id).collect();
    let owner_ids: Vec<i64> = projects.iter().map(|p| p.owner_id).collect();

    let owners: Vec<UserPublic> = sqlx::query_as(
        "SELECT id, username, email FROM users WHERE id = ANY($1)",
    )
    .bind(&owner_ids)
    .fetch_all(pool)
    .await?;
    let owners: HashMap<i64, UserPublic> = owners.into_iter().map(|u| (u.id, u)).collect();

    let mut members = db::members::members_by_project(pool, &project_ids).await?;

    let task_rows: Vec<TaskSummaryRow> = sqlx::query_as(
        "SELECT project_id, id, title, status, priority FROM tasks
         WHERE project_id = ANY($1) ORDER BY created_at DESC",
    )
    .bind(&project_ids)
    .fetch_all(pool)
    .await?;
    let mut tasks: HashMap<i64, Vec<TaskSummary>> = HashMap::new();
    for row in task_rows {
        tasks.entry(row.project_id).or_default().push(TaskSummary {
            id: row.id,
            title: row.title,
            status: row.status,
            priority: row.priority,
        });
    }

    let mut summaries = Vec::with_capacity(projects.len());
    for project in projects {
        let owner = owners
            .get(&project.owner_id)
            .cloned()
            .ok_or(sqlx::Error::RowNotFound)?;
        summaries.push(ProjectSummary {
            owner,
            members: members.remove(&project.id).unwrap_or_default(),
            tasks: tasks.remove(&project.id).unwrap_or_default(),
            project,
        });
    }
    Ok(summaries)
}
