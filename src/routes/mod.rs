pub mod auth;
pub mod comments;
pub mod projects;
pub mod tags;
pub mod tasks;

use axum::Json;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::Router;
use serde_json::json;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route(
            "/api/auth/profile",
            get(auth::get_profile).put(auth::update_profile),
        )
        .route("/api/auth/change-password", put(auth::change_password))
        // Projects
        .route("/api/projects", get(projects::list).post(projects::create))
        .route(
            "/api/projects/{id}",
            get(projects::get)
                .put(projects::update)
                .delete(projects::delete),
        )
        .route("/api/projects/{id}/members", post(projects::add_member))
        .route(
            "/api/projects/{id}/members/{user_id}",
            axum::routing::delete(projects::remove_member),
        )
        .route("/api/projects/{id}/search-users", get(projects::search_users))
        // Tasks
        .route("/api/tasks", get(tasks::list_all))
        .route(
            "/api/tasks/project/{project_id}",
            get(tasks::list_by_project).post(tasks::create),
        )
        .route(
            "/api/tasks/{id}",
            get(tasks::get).put(tasks::update).delete(tasks::delete),
        )
        .route("/api/tasks/{id}/assign-users", put(tasks::assign_users))
        .route("/api/tasks/{id}/assign-tags", put(tasks::assign_tags))
        // Comments
        .route(
            "/api/comments/task/{task_id}",
            get(comments::list).post(comments::create),
        )
        .route(
            "/api/comments/{id}",
            put(comments::update).delete(comments::delete),
        )
        // Tags
        .route("/api/tags", get(tags::list).post(tags::create))
        .route(
            "/api/tags/{id}",
            get(tags::get).put(tags::update).delete(tags::delete),
        )
        // Health
        .route("/api/health", get(health))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "success": true, "message": "API is running" }))
}

pub async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "message": "Route not found" })),
    )
}
