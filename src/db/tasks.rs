use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::{
    ProjectBrief, Tag, Task, TaskDetail, TaskPriority, TaskStatus, UserPublic,
};

pub async fn insert<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    project_id: i64,
    title: &str,
    description: Option<&str>,
    status: TaskStatus,
    priority: TaskPriority,
    due_date: Option<DateTime<Utc>>,
) -> Result<Task, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        "INSERT INTO tasks (project_id, title, description, status, priority, due_date)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(project_id)
    .bind(title)
    .bind(description)
    .bind(status)
    .bind(priority)
    .bind(due_date)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_by_project(pool: &PgPool, project_id: i64) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        "SELECT * FROM tasks WHERE project_id = $1 ORDER BY created_at DESC",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

/// Union of tasks across every project the user owns or belongs to.
pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        "SELECT t.* FROM tasks t
         JOIN projects p ON p.id = t.project_id
         WHERE p.owner_id = $1
            OR EXISTS(SELECT 1 FROM project_members pm
                      WHERE pm.project_id = p.id AND pm.user_id = $1)
         ORDER BY t.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Partial update. `set_due_date` controls whether `due_date` is written at
/// all, so the caller can clear it with an explicit null. `updated_at` is
/// stamped on every successful update regardless of which fields changed.
#[allow(clippy::too_many_arguments)]
pub async fn update(
    pool: &PgPool,
    id: i64,
    title: Option<&str>,
    description: Option<&str>,
    status: Option<TaskStatus>,
    priority: Option<TaskPriority>,
    set_due_date: bool,
    due_date: Option<DateTime<Utc>>,
) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        "UPDATE tasks SET
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            status = COALESCE($4, status),
            priority = COALESCE($5, priority),
            due_date = CASE WHEN $6 THEN $7 ELSE due_date END,
            updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(title)
    .bind(description)
    .bind(status)
    .bind(priority)
    .bind(set_due_date)
    .bind(due_date)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn clear_assignees<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    task_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM task_assignees WHERE task_id = $1")
        .bind(task_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn add_assignees<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    task_id: i64,
    user_ids: &[i64],
) -> Result<(), sqlx::Error> {
    if user_ids.is_empty() {
        return Ok(());
    }
    sqlx::query(
        "INSERT INTO task_assignees (task_id, user_id)
         SELECT $1, unnest($2::bigint[])
         ON CONFLICT DO NOTHING",
    )
    .bind(task_id)
    .bind(user_ids)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn clear_tags<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    task_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM task_tags WHERE task_id = $1")
        .bind(task_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn add_tags<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    task_id: i64,
    tag_ids: &[i64],
) -> Result<(), sqlx::Error> {
    if tag_ids.is_empty() {
        return Ok(());
    }
    sqlx::query(
        "INSERT INTO task_tags (task_id, tag_id)
         SELECT $1, unnest($2::bigint[])
         ON CONFLICT DO NOTHING",
    )
    .bind(task_id)
    .bind(tag_ids)
    .execute(executor)
    .await?;
    Ok(())
}

#[derive(Debug, sqlx::FromRow)]
struct AssigneeRow {
    task_id: i64,
    id: i64,
    username: String,
    email: String,
}

#[derive(Debug, sqlx::FromRow)]
struct TagRow {
    task_id: i64,
    id: i64,
    name: String,
    color: String,
}

pub async fn assignees_by_task(
    pool: &PgPool,
    task_ids: &[i64],
) -> Result<HashMap<i64, Vec<UserPublic>>, sqlx::Error> {
    let rows: Vec<AssigneeRow> = sqlx::query_as(
        "SELECT ta.task_id, u.id, u.username, u.email
         FROM task_assignees ta JOIN users u ON u.id = ta.user_id
         WHERE ta.task_id = ANY($1)
         ORDER BY u.username",
    )
    .bind(task_ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<i64, Vec<UserPublic>> = HashMap::new();
    for row in rows {
        grouped.entry(row.task_id).or_default().push(UserPublic {
            id: row.id,
            username: row.username,
            email: row.email,
        });
    }
    Ok(grouped)
}

pub async fn tags_by_task(
    pool: &PgPool,
    task_ids: &[i64],
) -> Result<HashMap<i64, Vec<Tag>>, sqlx::Error> {
    let rows: Vec<TagRow> = sqlx::query_as(
        "SELECT tt.task_id, g.id, g.name, g.color
         FROM task_tags tt JOIN tags g ON g.id = tt.tag_id
         WHERE tt.task_id = ANY($1)
         ORDER BY g.name",
    )
    .bind(task_ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<i64, Vec<Tag>> = HashMap::new();
    for row in rows {
        grouped.entry(row.task_id).or_default().push(Tag {
            id: row.id,
            name: row.name,
            color: row.color,
        });
    }
    Ok(grouped)
}

/// Attach assignees, tags and comments (with authors) to a page of tasks.
/// When `with_project` is set, a project summary is attached as well, for
/// the cross-project listing.
pub async fn attach_relations(
    pool: &PgPool,
    tasks: Vec<Task>,
    with_project: bool,
) -> Result<Vec<TaskDetail>, sqlx::Error> {
    let task_ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();

    let mut assignees = assignees_by_task(pool, &task_ids).await?;
    let mut tags = tags_by_task(pool, &task_ids).await?;
    let mut comments = crate::db::comments::comments_by_task(pool, &task_ids).await?;

    let mut projects: HashMap<i64, ProjectBrief> = HashMap::new();
    if with_project {
        let project_ids: Vec<i64> = tasks.iter().map(|t| t.project_id).collect();
        let rows: Vec<ProjectBrief> =
            sqlx::query_as("SELECT id, name FROM projects WHERE id = ANY($1)")
                .bind(&project_ids)
                .fetch_all(pool)
                .await?;
        projects = rows.into_iter().map(|p| (p.id, p)).collect();
    }

    let details = tasks
        .into_iter()
        .map(|task| TaskDetail {
            project: projects.get(&task.project_id).cloned(),
            assignees: assignees.remove(&task.id).unwrap_or_default(),
            tags: tags.remove(&task.id).unwrap_or_default(),
            comments: comments.remove(&task.id).unwrap_or_default(),
            task,
        })
        .collect();
    Ok(details)
}

/// Single-task convenience wrapper around [`attach_relations`].
pub async fn load_detail(
    pool: &PgPool,
    task: Task,
    with_project: bool,
) -> Result<TaskDetail, sqlx::Error> {
    let mut details = attach_relations(pool, vec![task], with_project).await?;
    details.pop().ok_or(sqlx::Error::RowNotFound)
}
