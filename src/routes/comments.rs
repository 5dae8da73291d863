use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::auth::extractor::AuthUser;
use crate::authz;
use crate::db;
use crate::error::AppError;
use crate::response::{self, ApiResponse};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CommentBody {
    pub content: String,
}

/// 404 if the task is missing, 403 unless the caller is owner or member
/// of the task's project.
async fn require_task_access(
    state: &SharedState,
    task_id: i64,
    user_id: i64,
) -> Result<(), AppError> {
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
    Ok(())
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(task_id): Path<i64>,
) -> Result<Json<ApiResponse>, AppError> {
    require_task_access(&state, task_id, auth.user_id).await?;

    let comments = db::comments::list_by_task(&state.pool, task_id).await?;
    Ok(response::ok("Comments", json!({ "comments": comments })))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(task_id): Path<i64>,
    Json(req): Json<CommentBody>,
) -> Result<(StatusCode, Json<ApiResponse>), AppError> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest(
            "Comment content is required".to_string(),
        ));
    }

    require_task_access(&state, task_id, auth.user_id).await?;

    let comment = db::comments::insert(&state.pool, task_id, auth.user_id, content).await?;
    let comment = db::comments::find_with_author(&state.pool, comment.id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

    Ok((
        StatusCode::CREATED,
        response::ok("Comment created successfully", json!({ "comment": comment })),
    ))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<CommentBody>,
) -> Result<Json<ApiResponse>, AppError> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest(
            "Comment content is required".to_string(),
        ));
    }

    let comment = db::comments::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    // Author only; there is no owner or admin override for comments.
    if !authz::is_comment_author(&comment, auth.user_id) {
        return Err(AppError::Forbidden(
            "Only the author may edit a comment".to_string(),
        ));
    }

    db::comments::update(&state.pool, id, content).await?;
    let comment = db::comments::find_with_author(&state.pool, id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

    Ok(response::ok(
        "Comment updated successfully",
        json!({ "comment": comment }),
    ))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse>, AppError> {
    let comment = db::comments::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    if !authz::is_comment_author(&comment, auth.user_id) {
        return Err(AppError::Forbidden(
            "Only the author may delete a comment".to_string(),
        ));
    }

    db::comments::delete(&state.pool, id).await?;

    Ok(response::ok_message("Comment deleted successfully"))
}
