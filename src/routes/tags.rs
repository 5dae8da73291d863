use std::sync::LazyLock;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::response::{self, ApiResponse};
use crate::state::SharedState;

const MAX_NAME_LEN: usize = 30;

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid regex"));

#[derive(Deserialize)]
pub struct CreateTag {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateTag {
    pub name: Option<String>,
    pub color: Option<String>,
}

fn validate_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Tag name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::BadRequest(
            "Tag name cannot exceed 30 characters".to_string(),
        ));
    }
    Ok(name)
}

fn validate_color(color: &str) -> Result<(), AppError> {
    if HEX_COLOR.is_match(color) {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "Color must be a 6-digit hex code (e.g. #FF5733)".to_string(),
        ))
    }
}

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<ApiResponse>, AppError> {
    let tags = db::tags::list(&state.pool).await?;
    Ok(response::ok("Tags", json!({ "tags": tags })))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse>, AppError> {
    let tag = db::tags::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".to_string()))?;
    Ok(response::ok("Tag", json!({ "tag": tag })))
}

pub async fn create(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateTag>,
) -> Result<(StatusCode, Json<ApiResponse>), AppError> {
    let name = validate_name(&req.name)?;

    if let Some(color) = &req.color {
        validate_color(color)?;
    }

    if db::tags::find_by_name_excluding(&state.pool, name, None)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "A tag with this name already exists".to_string(),
        ));
    }

    let color = req.color.as_deref().unwrap_or(db::tags::DEFAULT_COLOR);
    let tag = db::tags::insert(&state.pool, name, color)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("A tag with this name already exists".to_string())
            }
            _ => AppError::Database(e),
        })?;

    Ok((
        StatusCode::CREATED,
        response::ok("Tag created successfully", json!({ "tag": tag })),
    ))
}

pub async fn update(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTag>,
) -> Result<Json<ApiResponse>, AppError> {
    if req.name.is_none() && req.color.is_none() {
        return Err(AppError::BadRequest(
            "At least one field is required to update".to_string(),
        ));
    }

    let name = match &req.name {
        Some(name) => {
            let name = validate_name(name)?;
            if db::tags::find_by_name_excluding(&state.pool, name, Some(id))
                .await?
                .is_some()
            {
                return Err(AppError::Conflict(
                    "A tag with this name already exists".to_string(),
                ));
            }
            Some(name)
        }
        None => None,
    };

    if let Some(color) = &req.color {
        validate_color(color)?;
    }

    let tag = db::tags::update(&state.pool, id, name, req.color.as_deref())
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".to_string()))?;

    Ok(response::ok("Tag updated successfully", json!({ "tag": tag })))
}

pub async fn delete(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse>, AppError> {
    if db::tags::in_use(&state.pool, id).await? {
        return Err(AppError::Conflict(
            "Tag is in use by one or more tasks and cannot be deleted".to_string(),
        ));
    }

    let deleted = db::tags::delete(&state.pool, id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("Tag not found".to_string()));
    }

    Ok(response::ok_message("Tag deleted successfully"))
}
