use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::auth::extractor::AuthUser;
use crate::authz;
use crate::db;
use crate::error::AppError;
use crate::models::{Project, ProjectDetail, TaskWithAssignees};
use crate::response::{self, ApiResponse};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct AddMember {
    pub user_id: i64,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

/// Load the project or 404, then 403 unless the caller is owner or member.
async fn load_for_member(
    state: &SharedState,
    project_id: i64,
    user_id: i64,
) -> Result<Project, AppError> {
    let project = db::projects::find_by_id(&state.pool, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let member_ids = db::members::member_ids(&state.pool, project.id).await?;
    if !authz::is_project_member(&project, &member_ids, user_id) {
        return Err(AppError::Forbidden(
            "You do not have access to this project".to_string(),
        ));
    }
    Ok(project)
}

/// Load the project or 404, then 403 unless the caller is owner or admin.
async fn load_for_manager(
    state: &SharedState,
    project_id: i64,
    auth: &AuthUser,
) -> Result<Project, AppError> {
    let project = db::projects::find_by_id(&state.pool, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    if !authz::is_project_owner_or_admin(&project, auth.user_id, auth.role) {
        return Err(AppError::Forbidden(
            "Only the project owner or an administrator may do this".to_string(),
        ));
    }
    Ok(project)
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<ApiResponse>, AppError> {
    let projects = db::projects::list_for_user(&state.pool, auth.user_id).await?;
    let projects = db::projects::attach_relations(&state.pool, projects).await?;
    Ok(response::ok("Projects", json!({ "projects": projects })))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateProject>,
) -> Result<(StatusCode, Json<ApiResponse>), AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Project name is required".to_string()));
    }

    // The project row and the owner's membership row must land together;
    // access checks depend on the membership set.
    let mut tx = state.pool.begin().await?;
    let project =
        db::projects::insert(&mut *tx, name, req.description.as_deref(), auth.user_id).await?;
    db::members::insert(&mut *tx, project.id, auth.user_id).await?;
    tx.commit().await?;

    tracing::info!(project_id = project.id, owner_id = auth.user_id, "Project created");

    let mut summaries = db::projects::attach_relations(&state.pool, vec![project]).await?;
    let summary = summaries.pop().ok_or(sqlx::Error::RowNotFound)?;

    Ok((
        StatusCode::CREATED,
        response::ok("Project created successfully", json!({ "project": summary })),
    ))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse>, AppError> {
    let project = load_for_member(&state, id, auth.user_id).await?;

    let owner = db::users::find_by_id(&state.pool, project.owner_id)
        .await?
        .map(|u| crate::models::UserPublic {
            id: u.id,
            username: u.username,
            email: u.email,
        })
        .ok_or(sqlx::Error::RowNotFound)?;
    let members = db::members::list_for_project(&state.pool, project.id).await?;

    let tasks = db::tasks::list_by_project(&state.pool, project.id).await?;
    let task_ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
    let mut assignees = db::tasks::assignees_by_task(&state.pool, &task_ids).await?;
    let tasks: Vec<TaskWithAssignees> = tasks
        .into_iter()
        .map(|task| TaskWithAssignees {
            assignees: assignees.remove(&task.id).unwrap_or_default(),
            task,
        })
        .collect();

    let detail = ProjectDetail {
        project,
        owner,
        members,
        tasks,
    };

    Ok(response::ok("Project", json!({ "project": detail })))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateProject>,
) -> Result<Json<ApiResponse>, AppError> {
    load_for_manager(&state, id, &auth).await?;

    if req.name.is_none() && req.description.is_none() {
        return Err(AppError::BadRequest(
            "At least one field is required to update".to_string(),
        ));
    }
    if let Some(name) = &req.name {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("Project name cannot be empty".to_string()));
        }
    }

    let project = db::projects::update(
        &state.pool,
        id,
        req.name.as_deref().map(str::trim),
        req.description.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let mut summaries = db::projects::attach_relations(&state.pool, vec![project]).await?;
    let summary = summaries.pop().ok_or(sqlx::Error::RowNotFound)?;

    Ok(response::ok(
        "Project updated successfully",
        json!({ "project": summary }),
    ))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse>, AppError> {
    load_for_manager(&state, id, &auth).await?;

    let deleted = db::projects::delete(&state.pool, id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("Project not found".to_string()));
    }

    tracing::info!(project_id = id, "Project deleted");

    Ok(response::ok_message("Project deleted successfully"))
}

pub async fn add_member(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<AddMember>,
) -> Result<(StatusCode, Json<ApiResponse>), AppError> {
    let project = load_for_manager(&state, id, &auth).await?;

    let user = db::users::find_by_id(&state.pool, req.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if db::members::is_member(&state.pool, project.id, user.id).await? {
        return Err(AppError::Conflict(
            "User is already a member of this project".to_string(),
        ));
    }

    db::members::insert(&state.pool, project.id, user.id).await?;

    let member = crate::models::UserPublic {
        id: user.id,
        username: user.username,
        email: user.email,
    };

    Ok((
        StatusCode::CREATED,
        response::ok("Member added successfully", json!({ "member": member })),
    ))
}

pub async fn remove_member(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> Result<Json<ApiResponse>, AppError> {
    let project = db::projects::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    // Owner removal is rejected for every caller, including admins.
    if project.owner_id == user_id {
        return Err(AppError::BadRequest(
            "The project owner cannot be removed".to_string(),
        ));
    }

    // Membership existence comes before the caller's access check.
    if !db::members::is_member(&state.pool, project.id, user_id).await? {
        return Err(AppError::NotFound(
            "Member not found in this project".to_string(),
        ));
    }

    if !authz::is_project_owner_or_admin(&project, auth.user_id, auth.role) {
        return Err(AppError::Forbidden(
            "Only the project owner or an administrator may do this".to_string(),
        ));
    }

    db::members::delete(&state.pool, project.id, user_id).await?;

    Ok(response::ok_message("Member removed successfully"))
}

pub async fn search_users(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<ApiResponse>, AppError> {
    load_for_member(&state, id, auth.user_id).await?;

    let query = params.query.trim();
    if query.len() < 2 {
        return Err(AppError::BadRequest(
            "Search query must be at least 2 characters".to_string(),
        ));
    }

    let users = db::users::search_non_members(&state.pool, id, query).await?;
    Ok(response::ok("Users", json!({ "users": users })))
}
