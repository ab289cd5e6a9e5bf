//! Raw dhcpd.conf access.
//!
//! POST /api/dhcpd-conf
//! POST /api/update-dhcpd-conf

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{authorize, dhcpd_service};
use crate::config::AppState;
use crate::domain::HostReservation;
use crate::error::AppResult;
use crate::parser::parse_dhcpd_conf;
use crate::transport::SshTarget;

#[derive(Debug, Deserialize)]
pub struct ConfRequest {
    pub auth: SshTarget,
    #[serde(default)]
    pub subnet: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConfResponse {
    pub output: String,
    pub reservations: Vec<HostReservation>,
}

/// Handle POST /api/dhcpd-conf
///
/// Returns the file text and the reservations parsed from it, classified
/// with the selected subnet's device types.
pub async fn handle_dhcpd_conf(
    State(state): State<AppState>,
    Json(request): Json<ConfRequest>,
) -> AppResult<Json<ConfResponse>> {
    let inventory = authorize(&state, &request.auth).await?;
    let scope = inventory
        .find(&request.auth.host)?
        .scope(request.subnet.as_deref())?;
    let config = state.config().await;

    let output = dhcpd_service(&state, &config)
        .fetch_config(&request.auth)
        .await?;
    let reservations = parse_dhcpd_conf(&output, scope.type_descriptions);
    tracing::debug!("{} reservation(s) on {}", reservations.len(), request.auth.host);

    Ok(Json(ConfResponse { output, reservations }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConfRequest {
    pub auth: SshTarget,
    pub dhcpd_conf: String,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
}

/// Handle POST /api/update-dhcpd-conf
///
/// Replaces the whole file with the text supplied by the client.
pub async fn handle_update_dhcpd_conf(
    State(state): State<AppState>,
    Json(request): Json<UpdateConfRequest>,
) -> AppResult<Json<Value>> {
    authorize(&state, &request.auth).await?;
    let config = state.config().await;

    dhcpd_service(&state, &config)
        .apply_config(&request.auth, &request.dhcpd_conf)
        .await?;

    let action = request.action.as_deref().unwrap_or("Update Configuration");
    state
        .activity()
        .record(&request.auth.username, action, request.details.as_ref())
        .await;

    Ok(Json(json!({ "message": "DHCP configuration updated successfully" })))
}
