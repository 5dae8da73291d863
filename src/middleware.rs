use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;
use crate::state::SharedState;

/// General per-IP rate limit applied in front of every route.
pub async fn general_rate_limit(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    if let Err(retry_after) = state.general_limiter.check(addr.ip()) {
        return AppError::RateLimited(format!(
            "Too many requests. Try again in {retry_after} seconds."
        ))
        .into_response();
    }
    next.run(req).await
}
