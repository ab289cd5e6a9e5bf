//! Remote isc-dhcp-server management.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::transport::{shell_quote, SshTarget, Transport, TransportError, TransportResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Active,
    Inactive,
    Unknown,
}

/// Parsed `systemctl status` report.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub state: ServiceState,
    pub output: String,
}

impl ServiceStatus {
    pub fn from_output(output: String) -> Self {
        let state = match output
            .lines()
            .map(str::trim)
            .find_map(|line| line.strip_prefix("Active:"))
        {
            Some(value) if value.trim_start().starts_with("active (running)") => ServiceState::Active,
            Some(_) => ServiceState::Inactive,
            None => ServiceState::Unknown,
        };
        Self { state, output }
    }
}

/// Reads, replaces and restarts the DHCP configuration of one server.
pub struct DhcpdService {
    transport: Arc<dyn Transport>,
    conf_path: String,
    service_name: String,
}

impl DhcpdService {
    pub fn new(transport: Arc<dyn Transport>, conf_path: &str, service_name: &str) -> Self {
        Self {
            transport,
            conf_path: conf_path.to_string(),
            service_name: service_name.to_string(),
        }
    }

    /// Succeeds when the credentials open a shell on the server.
    pub async fn verify_login(&self, target: &SshTarget) -> TransportResult<()> {
        self.transport.run_remote_command(target, "true").await?;
        tracing::info!("Login verified for {}@{}", target.username, target.host);
        Ok(())
    }

    pub async fn status(&self, target: &SshTarget) -> TransportResult<ServiceStatus> {
        let command = format!("systemctl status {} --no-pager", shell_quote(&self.service_name));
        let output = match self.transport.run_remote_command(target, &command).await {
            Ok(output) => output,
            // systemctl exits 3 for a stopped unit but still prints the report.
            Err(TransportError::Exit { stdout, .. }) if !stdout.is_empty() => stdout,
            Err(e) => return Err(e),
        };
        Ok(ServiceStatus::from_output(output))
    }

    pub async fn fetch_config(&self, target: &SshTarget) -> TransportResult<String> {
        self.transport.read_remote_text(target, &self.conf_path).await
    }

    /// Back up, replace and restart, stamping files with today's date.
    pub async fn apply_config(&self, target: &SshTarget, content: &str) -> TransportResult<()> {
        self.apply_config_at(target, content, Local::now().date_naive())
            .await
    }

    pub async fn apply_config_at(&self, target: &SshTarget, content: &str, date: NaiveDate) -> TransportResult<()> {
        let stamp = date.format("%y-%m-%d").to_string();
        let backup_path = format!("{}.backup.{}", self.conf_path, stamp);
        let temp_path = format!("/tmp/dhcpd_conf_{}.conf", stamp);

        tracing::info!("Backing up {} on {} to {}", self.conf_path, target.host, backup_path);
        self.transport
            .run_remote_command(
                target,
                &format!(
                    "sudo -S cp {} {}",
                    shell_quote(&self.conf_path),
                    shell_quote(&backup_path)
                ),
            )
            .await?;

        self.transport
            .write_remote_text(target, &temp_path, content)
            .await?;

        self.transport
            .run_remote_command(
                target,
                &format!(
                    "sudo -S mv {} {}",
                    shell_quote(&temp_path),
                    shell_quote(&self.conf_path)
                ),
            )
            .await?;

        tracing::info!("Restarting {} on {}", self.service_name, target.host);
        self.transport
            .run_remote_command(
                target,
                &format!("sudo -S systemctl restart {}", shell_quote(&self.service_name)),
            )
            .await?;

        Ok(())
    }
}
