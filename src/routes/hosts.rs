//! Host reservation edits.
//!
//! POST /api/hosts
//! POST /api/hosts/delete
//!
//! The current file is fetched, edited in place and written back in one
//! request, so the edit always applies to what is on the server.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{authorize, dhcpd_service};
use crate::config::AppState;
use crate::editor::{delete_host, upsert_host, EditOutcome, HostChange};
use crate::error::{AppError, AppResult};
use crate::parser::parse_dhcpd_conf;
use crate::transport::SshTarget;
use crate::utils::{normalize_mac, validate_hostname, validate_ipv4};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertHostRequest {
    pub auth: SshTarget,
    #[serde(default)]
    pub subnet: Option<String>,
    /// Set when editing; absent or empty when adding.
    #[serde(default)]
    pub current_hostname: Option<String>,
    pub hostname: String,
    pub mac_address: String,
    pub ip_address: String,
}

/// Handle POST /api/hosts
///
/// Adds a reservation, or edits `currentHostname` in place.
pub async fn handle_upsert(
    State(state): State<AppState>,
    Json(request): Json<UpsertHostRequest>,
) -> AppResult<Json<Value>> {
    let hostname = request.hostname.trim();
    validate_hostname(hostname)?;
    validate_ipv4(&request.ip_address)?;
    let ip_address = request.ip_address.trim();
    let mac_address = normalize_mac(&request.mac_address)?;
    let current = request
        .current_hostname
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    let inventory = authorize(&state, &request.auth).await?;
    let scope = inventory
        .find(&request.auth.host)?
        .scope(request.subnet.as_deref())?;
    let config = state.config().await;
    let service = dhcpd_service(&state, &config);

    let raw = service.fetch_config(&request.auth).await?;
    let reservations = parse_dhcpd_conf(&raw, scope.type_descriptions);
    let exists = |name: &str| reservations.iter().any(|r| r.hostname == name);

    if let Some(current) = current {
        if !exists(current) {
            return Err(AppError::NotFound(format!("Host {} not found", current)));
        }
    }
    if current != Some(hostname) && exists(hostname) {
        return Err(AppError::Conflict(format!("Host {} already exists", hostname)));
    }
    if let Some(other) = reservations
        .iter()
        .find(|r| r.ip_address == ip_address && Some(r.hostname.as_str()) != current)
    {
        return Err(AppError::Conflict(format!(
            "{} is already reserved for {}",
            ip_address, other.hostname
        )));
    }

    let change = HostChange {
        ip_address: Some(ip_address),
        mac_address: Some(&mac_address),
        hostname: Some(hostname),
    };
    let edit = upsert_host(&raw, current.unwrap_or(hostname), change, scope.type_descriptions);

    service.apply_config(&request.auth, &edit.text).await?;

    let action = if current.is_some() { "Edit Entry" } else { "Add Entry" };
    let mut details = json!({
        "ipAddress": ip_address,
        "hostname": hostname,
        "macAddress": mac_address,
    });
    if let Some(current) = current {
        details["previousHostname"] = json!(current);
    }
    state
        .activity()
        .record(&request.auth.username, action, Some(&details))
        .await;

    Ok(Json(json!({
        "message": format!("Successfully updated entry for {}", hostname),
        "outcome": edit.outcome,
    })))
}

#[derive(Debug, Deserialize)]
pub struct DeleteHostRequest {
    pub auth: SshTarget,
    pub hostname: String,
}

/// Handle POST /api/hosts/delete
///
/// Nothing is written when the host is not in the file.
pub async fn handle_delete(
    State(state): State<AppState>,
    Json(request): Json<DeleteHostRequest>,
) -> AppResult<Json<Value>> {
    authorize(&state, &request.auth).await?;
    let hostname = request.hostname.trim();
    let config = state.config().await;
    let service = dhcpd_service(&state, &config);

    let raw = service.fetch_config(&request.auth).await?;
    let edit = delete_host(&raw, hostname);
    if edit.outcome == EditOutcome::NotFound {
        return Err(AppError::NotFound(format!("Host {} not found", hostname)));
    }

    service.apply_config(&request.auth, &edit.text).await?;
    state
        .activity()
        .record(
            &request.auth.username,
            "Delete Entry",
            Some(&json!({ "hostname": hostname })),
        )
        .await;

    Ok(Json(json!({
        "message": format!("Successfully deleted entry for {}", hostname),
        "outcome": edit.outcome,
    })))
}

#[cfg(test)]
mod tests {
    use crate::parser::parse_dhcpd_conf;
    use crate::routes::test_support::*;
    use crate::domain::DeviceTypeMap;
    use axum::http::StatusCode;
    use serde_json::json;

    fn hosts(conf: &str) -> Vec<(String, String, String)> {
        parse_dhcpd_conf(conf, &DeviceTypeMap::new())
            .into_iter()
            .map(|r| (r.hostname, r.ip_address, r.mac_address))
            .collect()
    }

    #[tokio::test]
    async fn test_add_entry() {
        let app = TestApp::new();
        let (status, body) = app
            .post(
                "/api/hosts",
                json!({
                    "auth": auth(),
                    "hostname": "srv2",
                    "macAddress": "AA-BB-CC-DD-EE-10",
                    "ipAddress": "10.110.20.6"
                }),
            )
            .await;

        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["outcome"], "Inserted");

        let conf = app.conf();
        assert!(conf.contains("host srv2 { hardware ethernet aa:bb:cc:dd:ee:10; fixed-address 10.110.20.6; }"));
        assert!(conf.starts_with("option domain-name"));
        assert_eq!(hosts(&conf).len(), 3);

        let entries = app.activity.entries();
        assert_eq!(entries[0].action, "Add Entry");
        let details = entries[0].details.clone().unwrap();
        assert_eq!(details["hostname"], "srv2");
        assert!(details.get("previousHostname").is_none());
    }

    #[tokio::test]
    async fn test_edit_entry_renames_in_place() {
        let app = TestApp::new();
        let (status, body) = app
            .post(
                "/api/hosts",
                json!({
                    "auth": auth(),
                    "currentHostname": "prn1",
                    "hostname": "prn-lobby",
                    "macAddress": "aa:bb:cc:dd:ee:02",
                    "ipAddress": "10.110.30.10"
                }),
            )
            .await;

        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["outcome"], "Updated");

        let conf = app.conf();
        let lines: Vec<&str> = conf.lines().collect();
        assert_eq!(
            lines[4],
            "host prn-lobby { hardware ethernet aa:bb:cc:dd:ee:02; fixed-address 10.110.30.10; }"
        );
        assert!(!conf.contains("prn1"));

        let entries = app.activity.entries();
        assert_eq!(entries[0].action, "Edit Entry");
        assert_eq!(entries[0].details.as_ref().unwrap()["previousHostname"], "prn1");
    }

    #[tokio::test]
    async fn test_add_existing_hostname_conflicts() {
        let app = TestApp::new();
        let (status, _) = app
            .post(
                "/api/hosts",
                json!({
                    "auth": auth(),
                    "hostname": "srv1",
                    "macAddress": "aa:bb:cc:dd:ee:99",
                    "ipAddress": "10.110.20.99"
                }),
            )
            .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(app.conf(), DHCPD_CONF);
        assert!(app.transport.commands().is_empty());
    }

    #[tokio::test]
    async fn test_taken_address_conflicts() {
        let app = TestApp::new();
        let (status, body) = app
            .post(
                "/api/hosts",
                json!({
                    "auth": auth(),
                    "hostname": "srv9",
                    "macAddress": "aa:bb:cc:dd:ee:99",
                    "ipAddress": "10.110.20.5"
                }),
            )
            .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("srv1"));
    }

    #[tokio::test]
    async fn test_edit_missing_host() {
        let app = TestApp::new();
        let (status, _) = app
            .post(
                "/api/hosts",
                json!({
                    "auth": auth(),
                    "currentHostname": "ghost",
                    "hostname": "ghost",
                    "macAddress": "aa:bb:cc:dd:ee:99",
                    "ipAddress": "10.110.20.99"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_input_rejected() {
        let app = TestApp::new();
        for (hostname, mac, ip) in [
            ("bad name", "aa:bb:cc:dd:ee:99", "10.110.20.99"),
            ("ok", "aa:bb:cc:dd:ee", "10.110.20.99"),
            ("ok", "aa:bb:cc:dd:ee:99", "10.110.20.300"),
        ] {
            let (status, _) = app
                .post(
                    "/api/hosts",
                    json!({"auth": auth(), "hostname": hostname, "macAddress": mac, "ipAddress": ip}),
                )
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{} {} {}", hostname, mac, ip);
        }
        assert!(app.transport.commands().is_empty());
    }

    #[tokio::test]
    async fn test_delete_entry() {
        let app = TestApp::new();
        let (status, body) = app
            .post("/api/hosts/delete", json!({"auth": auth(), "hostname": "srv1"}))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "Deleted");

        let conf = app.conf();
        assert_eq!(conf.lines().count(), DHCPD_CONF.lines().count() - 1);
        assert_eq!(hosts(&conf), vec![(
            "prn1".to_string(),
            "10.110.30.9".to_string(),
            "aa:bb:cc:dd:ee:02".to_string()
        )]);

        let entries = app.activity.entries();
        assert_eq!(entries[0].action, "Delete Entry");
        assert_eq!(entries[0].details, Some(json!({"hostname": "srv1"})));
    }

    #[tokio::test]
    async fn test_delete_missing_host() {
        let app = TestApp::new();
        let (status, _) = app
            .post("/api/hosts/delete", json!({"auth": auth(), "hostname": "ghost"}))
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(app.conf(), DHCPD_CONF);
        assert!(app.transport.commands().is_empty());
        assert!(app.activity.entries().is_empty());
    }
}
