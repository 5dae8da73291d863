use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::json;

use crate::auth::extractor::AuthUser;
use crate::authz;
use crate::db;
use crate::error::AppError;
use crate::models::{Task, TaskPriority, TaskStatus};
use crate::response::{self, ApiResponse};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assignees: Vec<i64>,
    #[serde(default)]
    pub tags: Vec<i64>,
}

#[derive(Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    /// Absent field leaves the due date alone; an explicit null clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

#[derive(Deserialize)]
pub struct AssignUsers {
    pub user_ids: Vec<i64>,
}

#[derive(Deserialize)]
pub struct AssignTags {
    pub tag_ids: Vec<i64>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Load a task or 404, then 403 unless the caller can access its project.
async fn load_for_member(
    state: &SharedState,
    task_id: i64,
    user_id: i64,
) -> Result<Task, AppError> {
    let task = db::tasks::find_by_id(&state.pool, task_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

    let project = db::projects::find_by_id(&state.pool, task.project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    let member_ids = db::members::member_ids(&state.pool, project.id).await?;
    if !authz::is_project_member(&project, &member_ids, user_id) {
        return Err(AppError::Forbidden(
            "You do not have access to this task".to_string(),
        ));
    }
    Ok(task)
}

fn map_reference_violation(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            AppError::BadRequest("Unknown user or tag reference".to_string())
        }
        _ => AppError::Database(e),
    }
}

/// All tasks across every project the caller owns or belongs to.
pub async fn list_all(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<ApiResponse>, AppError> {
    let tasks = db::tasks::list_for_user(&state.pool, auth.user_id).await?;
    let tasks = db::tasks::attach_relations(&state.pool, tasks, true).await?;
    Ok(response::ok("Tasks", json!({ "tasks": tasks })))
}

pub async fn list_by_project(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<i64>,
) -> Result<Json<ApiResponse>, AppError> {
    let project = db::projects::find_by_id(&state.pool, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    let member_ids = db::members::member_ids(&state.pool, project.id).await?;
    if !authz::is_project_member(&project, &member_ids, auth.user_id) {
        return Err(AppError::Forbidden(
            "You do not have access to this project".to_string(),
        ));
    }

    let tasks = db::tasks::list_by_project(&state.pool, project.id).await?;
    let tasks = db::tasks::attach_relations(&state.pool, tasks, false).await?;
    Ok(response::ok("Tasks", json!({ "tasks": tasks })))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<i64>,
    Json(req): Json<CreateTask>,
) -> Result<(StatusCode, Json<ApiResponse>), AppError> {
    let project = db::projects::find_by_id(&state.pool, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    let member_ids = db::members::member_ids(&state.pool, project.id).await?;
    if !authz::is_project_member(&project, &member_ids, auth.user_id) {
        return Err(AppError::Forbidden(
            "You do not have access to this project".to_string(),
        ));
    }

    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("Task title is required".to_string()));
    }

    // Task row plus initial assignee/tag join rows, all or nothing.
    let mut tx = state.pool.begin().await?;
    let task = db::tasks::insert(
        &mut *tx,
        project.id,
        title,
        req.description.as_deref(),
        req.status.unwrap_or(TaskStatus::Pending),
        req.priority.unwrap_or(TaskPriority::Medium),
        req.due_date,
    )
    .await?;
    db::tasks::add_assignees(&mut *tx, task.id, &req.assignees)
        .await
        .map_err(map_reference_violation)?;
    db::tasks::add_tags(&mut *tx, task.id, &req.tags)
        .await
        .map_err(map_reference_violation)?;
    tx.commit().await?;

    tracing::info!(task_id = task.id, project_id = project.id, "Task created");

    let detail = db::tasks::load_detail(&state.pool, task, false).await?;

    Ok((
        StatusCode::CREATED,
        response::ok("Task created successfully", json!({ "task": detail })),
    ))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse>, AppError> {
    let task = load_for_member(&state, id, auth.user_id).await?;
    let detail = db::tasks::load_detail(&state.pool, task, true).await?;
    Ok(response::ok("Task", json!({ "task": detail })))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTask>,
) -> Result<Json<ApiResponse>, AppError> {
    load_for_member(&state, id, auth.user_id).await?;

    let has_field = req.title.is_some()
        || req.description.is_some()
        || req.status.is_some()
        || req.priority.is_some()
        || req.due_date.is_some();
    if !has_field {
        return Err(AppError::BadRequest(
            "At least one field is required to update".to_string(),
        ));
    }
    if let Some(title) = &req.title {
        if title.trim().is_empty() {
            return Err(AppError::BadRequest("Task title cannot be empty".to_string()));
        }
    }

    let task = db::tasks::update(
        &state.pool,
        id,
        req.title.as_deref().map(str::trim),
        req.description.as_deref(),
        req.status,
        req.priority,
        req.due_date.is_some(),
        req.due_date.flatten(),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

    let detail = db::tasks::load_detail(&state.pool, task, false).await?;

    Ok(response::ok(
        "Task updated successfully",
        json!({ "task": detail }),
    ))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse>, AppError> {
    load_for_member(&state, id, auth.user_id).await?;

    let deleted = db::tasks::delete(&state.pool, id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("Task not found".to_string()));
    }

    Ok(response::ok_message("Task deleted successfully"))
}

pub async fn assign_users(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<AssignUsers>,
) -> Result<Json<ApiResponse>, AppError> {
    let task = load_for_member(&state, id, auth.user_id).await?;

    // Full replace: the provided set becomes the assignee set, atomically.
    let mut tx = state.pool.begin().await?;
    db::tasks::clear_assignees(&mut *tx, task.id).await?;
    db::tasks::add_assignees(&mut *tx, task.id, &req.user_ids)
        .await
        .map_err(map_reference_violation)?;
    tx.commit().await?;

    let detail = db::tasks::load_detail(&state.pool, task, false).await?;

    Ok(response::ok(
        "Assignees updated successfully",
        json!({ "task": detail }),
    ))
}

pub async fn assign_tags(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<AssignTags>,
) -> Result<Json<ApiResponse>, AppError> {
    let task = load_for_member(&state, id, auth.user_id).await?;

    let mut tx = state.pool.begin().await?;
    db::tasks::clear_tags(&mut *tx, task.id).await?;
    db::tasks::add_tags(&mut *tx, task.id, &req.tag_ids)
        .await
        .map_err(map_reference_violation)?;
    tx.commit().await?;

    let detail = db::tasks::load_detail(&state.pool, task, false).await?;

    Ok(response::ok(
        "Tags updated successfully",
        json!({ "task": detail }),
    ))
}
