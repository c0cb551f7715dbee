//! Proximity discovery endpoint

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{GatewayError, GatewayResult};
use crate::geo::haversine_km;
use crate::rest::CallerIdentity;
use crate::state::GatewayState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DiscoveredPeer {
    pub username: String,
    /// Distance from the caller in kilometers. Absent in fallback mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

/// Peers near the caller, nearest first.
///
/// A caller without a recorded location gets every other user instead,
/// unranked and with no radius applied.
#[utoipa::path(
    post,
    path = "/api/discover",
    tag = "discovery",
    responses(
        (status = 200, description = "Nearby peers, ascending by distance", body = [DiscoveredPeer]),
        (status = 404, description = "Caller is not a registered user"),
    )
)]
pub async fn discover(
    State(state): State<Arc<GatewayState>>,
    caller: CallerIdentity,
) -> GatewayResult<Json<Vec<DiscoveredPeer>>> {
    let user = state
        .users
        .find_by_username(&caller.0)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("unknown user {}", caller.0)))?;

    let peers = state.users.list_peers(&caller.0).await?;

    let Some(origin) = user.location else {
        return Ok(Json(
            peers
                .into_iter()
                .map(|peer| DiscoveredPeer {
                    username: peer.username,
                    distance_km: None,
                })
                .collect(),
        ));
    };

    let mut ranked: Vec<(f64, String)> = peers
        .into_iter()
        .filter_map(|peer| {
            peer.location
                .map(|location| (haversine_km(origin, location), peer.username))
        })
        .filter(|(distance, _)| *distance <= state.discovery.radius_km)
        .collect();
    ranked.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    Ok(Json(
        ranked
            .into_iter()
            .map(|(distance, username)| DiscoveredPeer {
                username,
                distance_km: Some(distance),
            })
            .collect(),
    ))
}
