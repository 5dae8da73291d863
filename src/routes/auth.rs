use std::net::SocketAddr;

use axum::Json;
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::auth::extractor::AuthUser;
use crate::auth::jwt::{Claims, encode_token};
use crate::auth::password;
use crate::db;
use crate::error::AppError;
use crate::response::{self, ApiResponse};
use crate::state::SharedState;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

fn issue_token(user_id: i64, state: &SharedState) -> Result<String, AppError> {
    let claims = Claims::new(user_id, state.config.token_ttl_days);
    encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)
}

pub async fn register(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse>), AppError> {
    let ip = addr.ip();
    if state.auth_limiter.check(ip).is_err() {
        return Err(AppError::RateLimited(
            "Too many attempts. Please try again later.".to_string(),
        ));
    }

    if req.username.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        state.auth_limiter.record_failure(ip);
        return Err(AppError::BadRequest(
            "Username, email and password are required".to_string(),
        ));
    }

    if req.password.len() < MIN_PASSWORD_LEN {
        state.auth_limiter.record_failure(ip);
        return Err(AppError::BadRequest(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    if db::users::find_by_email(&state.pool, &req.email).await?.is_some() {
        state.auth_limiter.record_failure(ip);
        return Err(AppError::Conflict("Email is already registered".to_string()));
    }

    let role_id = match req.role_id {
        Some(id) => {
            db::roles::find_by_id(&state.pool, id)
                .await?
                .ok_or_else(|| AppError::BadRequest("Unknown role".to_string()))?
                .id
        }
        None => {
            db::roles::find_by_name(&state.pool, db::roles::DEFAULT_ROLE)
                .await?
                .ok_or_else(|| AppError::Internal("Default role is not seeded".to_string()))?
                .id
        }
    };

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    let user = db::users::create(&state.pool, req.username.trim(), &req.email, &pw_hash, role_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Email is already registered".to_string())
            }
            _ => AppError::Database(e),
        })?;

    let profile = db::users::find_profile(&state.pool, user.id)
        .await?
        .ok_or_else(|| AppError::Internal("Registered user vanished".to_string()))?;
    let token = issue_token(user.id, &state)?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        response::ok(
            "User registered successfully",
            json!({ "user": profile, "token": token }),
        ),
    ))
}

pub async fn login(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    let ip = addr.ip();
    if state.auth_limiter.check(ip).is_err() {
        return Err(AppError::RateLimited(
            "Too many attempts. Please try again later.".to_string(),
        ));
    }

    if req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    // Unknown email and wrong password produce the same error so callers
    // cannot enumerate accounts.
    let Some(user) = db::users::find_by_email(&state.pool, &req.email).await? else {
        state.auth_limiter.record_failure(ip);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };

    let valid = password::verify(&req.password, &user.password_hash).map_err(AppError::Internal)?;
    if !valid {
        state.auth_limiter.record_failure(ip);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let profile = db::users::find_profile(&state.pool, user.id)
        .await?
        .ok_or_else(|| AppError::Internal("User profile missing".to_string()))?;
    let token = issue_token(user.id, &state)?;

    Ok(response::ok(
        "Login successful",
        json!({ "user": profile, "token": token }),
    ))
}

pub async fn get_profile(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<ApiResponse>, AppError> {
    let profile = db::users::find_profile(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(response::ok("Profile", json!({ "user": profile })))
}

pub async fn update_profile(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    if req.username.is_none() && req.email.is_none() {
        return Err(AppError::BadRequest(
            "At least one field is required to update".to_string(),
        ));
    }

    if let Some(email) = &req.email {
        if db::users::email_taken_by_other(&state.pool, email, auth.user_id).await? {
            return Err(AppError::Conflict(
                "Email is already in use by another user".to_string(),
            ));
        }
    }

    db::users::update_profile(
        &state.pool,
        auth.user_id,
        req.username.as_deref(),
        req.email.as_deref(),
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("Email is already in use by another user".to_string())
        }
        _ => AppError::Database(e),
    })?;

    let profile = db::users::find_profile(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(response::ok(
        "Profile updated successfully",
        json!({ "user": profile }),
    ))
}

pub async fn change_password(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    if req.current_password.is_empty() || req.new_password.is_empty() {
        return Err(AppError::BadRequest(
            "Current and new password are required".to_string(),
        ));
    }

    if req.new_password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(
            "New password must be at least 6 characters".to_string(),
        ));
    }

    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let valid =
        password::verify(&req.current_password, &user.password_hash).map_err(AppError::Internal)?;
    if !valid {
        return Err(AppError::BadRequest(
            "Current password is incorrect".to_string(),
        ));
    }

    let pw_hash = password::hash(&req.new_password).map_err(AppError::Internal)?;
    db::users::update_password(&state.pool, user.id, &pw_hash).await?;

    Ok(response::ok_message("Password updated successfully"))
}
