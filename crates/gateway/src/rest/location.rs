//! Location update endpoint

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::GatewayResult;
use crate::rest::CallerIdentity;
use crate::state::GatewayState;
use vicinity_database::GeoPoint;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateLocationRequest {
    pub longitude: f64,
    pub latitude: f64,
}

/// Record the caller's current coordinate for proximity discovery.
#[utoipa::path(
    post,
    path = "/api/update-location",
    tag = "discovery",
    request_body = UpdateLocationRequest,
    responses(
        (status = 204, description = "Location updated"),
        (status = 404, description = "Caller is not a registered user"),
    )
)]
pub async fn update_location(
    State(state): State<Arc<GatewayState>>,
    caller: CallerIdentity,
    Json(request): Json<UpdateLocationRequest>,
) -> GatewayResult<StatusCode> {
    state
        .users
        .set_location(
            &caller.0,
            GeoPoint::new(request.longitude, request.latitude),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
