//! Health endpoint

use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::GatewayResult;
use crate::state::GatewayState;

#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is healthy"))
)]
pub async fn health(State(state): State<Arc<GatewayState>>) -> GatewayResult<Json<Value>> {
    sqlx::query("SELECT 1").fetch_one(&state.pool).await?;
    Ok(Json(json!({ "status": "ok" })))
}
