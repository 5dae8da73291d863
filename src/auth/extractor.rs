use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::jwt::{self, TokenError};
use crate::authz::UserRole;
use crate::db;
use crate::error::AppError;
use crate::state::SharedState;

/// Request context built once per request from the bearer token.
/// Handlers receive it as a parameter; nothing is attached to the
/// request mid-pipeline.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub role: UserRole,
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .ok_or_else(|| AppError::Unauthorized("Authentication token required".to_string()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Authentication token required".to_string()))?;

        let claims = jwt::decode_token(token, &state.config.jwt_secret).map_err(|e| {
            match e {
                TokenError::Expired => tracing::debug!("Rejected expired token"),
                TokenError::Invalid => tracing::debug!("Rejected malformed token"),
            }
            AppError::Unauthorized("Invalid or expired token".to_string())
        })?;

        // Role is read fresh so a role change takes effect on the next request.
        let user = db::users::find_with_role(&state.pool, claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

        Ok(AuthUser {
            user_id: user.id,
            role: UserRole::from_name(&user.role_name),
        })
    }
}
