use super::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};

/// GET /api
pub async fn api_root(State(state): State<AppState>) -> Json<Value> {
    let base = state.config.base_uri();
    Json(json!({
        "name": "Courseware API",
        "description": "Machine interface for course content and enrollment.",
        "uri": format!("{base}/api"),
        "resources": [
            { "uri": format!("{base}/api/courses") },
            { "uri": format!("{base}/api/system") },
        ],
    }))
}

/// GET /api/system
pub async fn system_detail(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": "Courseware System API",
        "description": "System interface for retrieving course info.",
        "uri": format!("{}/api/system", state.config.base_uri()),
    }))
}
