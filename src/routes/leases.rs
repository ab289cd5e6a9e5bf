//! Lease table for one device type.
//!
//! POST /api/leases

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::{authorize, dhcpd_service};
use crate::config::AppState;
use crate::error::{AppError, AppResult};
use crate::leases::{lease_table, prefix_names_network, LeaseTable};
use crate::parser::parse_dhcpd_conf;
use crate::transport::SshTarget;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeasesRequest {
    pub auth: SshTarget,
    #[serde(default)]
    pub subnet: Option<String>,
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub page_size: Option<usize>,
}

/// Handle POST /api/leases
///
/// Every address of the type's octets, marked free or taken by the
/// reservations currently in dhcpd.conf. A three-component prefix allows
/// only one octet per type.
pub async fn handle_leases(
    State(state): State<AppState>,
    Json(request): Json<LeasesRequest>,
) -> AppResult<Json<LeaseTable>> {
    let inventory = authorize(&state, &request.auth).await?;
    let scope = inventory
        .find(&request.auth.host)?
        .scope(request.subnet.as_deref())?;
    let octets = scope
        .type_descriptions
        .octets(&request.device_type)
        .ok_or_else(|| AppError::NotFound(format!("Unknown device type: {}", request.device_type)))?;
    if octets.len() > 1 && prefix_names_network(scope.ip_prefix) {
        return Err(AppError::BadRequest(format!(
            "Device type {} lists {} octets but prefix {} names a single network",
            request.device_type,
            octets.len(),
            scope.ip_prefix
        )));
    }
    let config = state.config().await;

    let raw = dhcpd_service(&state, &config)
        .fetch_config(&request.auth)
        .await?;
    let reservations = parse_dhcpd_conf(&raw, scope.type_descriptions);

    let table = lease_table(
        &reservations,
        scope.ip_prefix,
        octets,
        request.page.unwrap_or(1),
        request.page_size.unwrap_or(config.page_size),
    );
    Ok(Json(table))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_lease_table_for_type() {
        let app = TestApp::new();
        let (status, body) = app
            .post("/api/leases", json!({"auth": auth(), "type": "Servers"}))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["paged"], false);
        let entries = body["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 255);
        assert_eq!(entries[0]["ip"], "10.110.20.1");
        assert_eq!(entries[4]["status"], "Taken");
        assert_eq!(entries[4]["hostname"], "srv1");
        assert_eq!(entries[4]["macAddress"], "AA:BB:CC:DD:EE:01");
        assert_eq!(entries[5]["status"], "Free");
    }

    #[tokio::test]
    async fn test_unknown_type() {
        let app = TestApp::new();
        let (status, body) = app
            .post("/api/leases", json!({"auth": auth(), "type": "Toasters"}))
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("Toasters"));
    }

    #[tokio::test]
    async fn test_subnet_lease_table() {
        let app = TestApp::new();
        let (status, body) = app
            .post(
                "/api/leases",
                json!({"auth": school_auth(), "type": "Staff", "subnet": "Main"}),
            )
            .await;

        assert_eq!(status, StatusCode::OK, "{}", body);
        let entries = body["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 255);
        assert_eq!(entries[0]["ip"], "10.20.114.1");
    }

    #[tokio::test]
    async fn test_multiple_octets_under_network_prefix() {
        let app = TestApp::new();
        let (status, body) = app
            .post(
                "/api/leases",
                json!({"auth": school_auth(), "type": "Mixed", "subnet": "Main"}),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("10.20.114"));
        assert!(app.transport.commands().is_empty());
    }

    #[tokio::test]
    async fn test_legacy_server_ignores_subnet() {
        let app = TestApp::new();
        let (status, _) = app
            .post(
                "/api/leases",
                json!({"auth": auth(), "type": "Servers", "subnet": "Annex"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
}
