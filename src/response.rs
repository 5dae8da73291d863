use axum::Json;
use serde::Serialize;
use serde_json::Value;

/// Uniform response envelope used by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

pub fn ok(message: &str, data: Value) -> Json<ApiResponse> {
    Json(ApiResponse {
        success: true,
        message: message.to_string(),
        data: Some(data),
    })
}

pub fn ok_message(message: &str) -> Json<ApiResponse> {
    Json(ApiResponse {
        success: true,
        message: message.to_string(),
        data: None,
    })
}
