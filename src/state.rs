use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::rate_limit::{AuthRateLimiter, GeneralRateLimiter};

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub general_limiter: GeneralRateLimiter,
    pub auth_limiter: AuthRateLimiter,
}
