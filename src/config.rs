use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::domain::Inventory;
use crate::error::AppError;
use crate::leases::DEFAULT_PAGE_SIZE;
use crate::services::{ActivitySink, FileActivityLog};
use crate::transport::{OpenSshTransport, Transport};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/dhcpviewd.conf";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_SERVERS_PATH: &str = "/etc/dhcpviewd/servers.json";
const DEFAULT_LOG_DIR: &str = "/var/log/dhcpviewd";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_DHCPD_CONF_PATH: &str = "/etc/dhcp/dhcpd.conf";
const DEFAULT_DHCP_SERVICE: &str = "isc-dhcp-server";
const DEFAULT_SSH_TIMEOUT_SECS: u64 = 30;
const ENV_PREFIX: &str = "DHCPVIEW_";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_address: IpAddr,
    pub port: u16,
    pub servers_path: PathBuf,
    /// `None` logs to stdout.
    pub log_dir: Option<PathBuf>,
    pub log_level: String,
    pub dhcpd_conf_path: String,
    pub dhcp_service: String,
    pub ssh_timeout_secs: u64,
    pub page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            servers_path: PathBuf::from(DEFAULT_SERVERS_PATH),
            log_dir: Some(PathBuf::from(DEFAULT_LOG_DIR)),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            dhcpd_conf_path: DEFAULT_DHCPD_CONF_PATH.to_string(),
            dhcp_service: DEFAULT_DHCP_SERVICE.to_string(),
            ssh_timeout_secs: DEFAULT_SSH_TIMEOUT_SECS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Load from a `key = value` file, then apply `DHCPVIEW_*` overrides.
    /// A missing file means all defaults.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let mut config = if path.exists() {
            Self::parse(&std::fs::read_to_string(path)?)?
        } else {
            tracing::warn!("Config file {:?} not found, using defaults", path);
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(format!("{}{}", ENV_PREFIX, key)).ok())?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, AppError> {
        let mut config = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) => config.set(key.trim(), value.trim())?,
                None => tracing::warn!("Ignoring config line without '=': {}", line),
            }
        }
        Ok(config)
    }

    /// Apply overrides; `lookup` gets the upper-case key without prefix.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), AppError> {
        for key in [
            "bind_address",
            "port",
            "servers_path",
            "log_dir",
            "log_level",
            "dhcpd_conf_path",
            "dhcp_service",
            "ssh_timeout_secs",
            "page_size",
        ] {
            if let Some(value) = lookup(&key.to_uppercase()) {
                self.set(key, value.trim())?;
            }
        }
        Ok(())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        let invalid = |what: &str| AppError::Config(format!("Invalid {}: {}", what, value));
        match key {
            "bind_address" => self.bind_address = value.parse().map_err(|_| invalid("bind_address"))?,
            "port" => self.port = value.parse().map_err(|_| invalid("port"))?,
            "servers_path" => self.servers_path = PathBuf::from(value),
            "log_dir" => {
                self.log_dir = match value {
                    "" | "-" => None,
                    dir => Some(PathBuf::from(dir)),
                }
            }
            "log_level" => self.log_level = value.to_string(),
            "dhcpd_conf_path" => self.dhcpd_conf_path = value.to_string(),
            "dhcp_service" => self.dhcp_service = value.to_string(),
            "ssh_timeout_secs" => {
                self.ssh_timeout_secs = value.parse().map_err(|_| invalid("ssh_timeout_secs"))?
            }
            "page_size" => self.page_size = value.parse().map_err(|_| invalid("page_size"))?,
            _ => tracing::warn!("Unknown config key: {}", key),
        }
        Ok(())
    }

    /// Filter directive for tracing-subscriber.
    pub fn tracing_filter(&self) -> String {
        format!("dhcpview={},dhcpviewd={}", self.log_level, self.log_level)
    }

    pub fn ssh_timeout(&self) -> Duration {
        Duration::from_secs(self.ssh_timeout_secs)
    }

    /// Where activity.log lives: the log directory, or next to servers.json.
    pub fn activity_dir(&self) -> PathBuf {
        match &self.log_dir {
            Some(dir) => dir.clone(),
            None => self
                .servers_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

struct Inner {
    config_path: Option<PathBuf>,
    config: RwLock<Arc<Config>>,
    inventory: RwLock<Arc<Inventory>>,
    transport: Arc<dyn Transport>,
    activity: Arc<dyn ActivitySink>,
}

/// Shared application state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

impl AppState {
    pub fn new(config_path: PathBuf) -> Result<Self, AppError> {
        let config = Config::load(&config_path)?;
        let inventory = Inventory::load(&config.servers_path)?;
        let transport = Arc::new(OpenSshTransport::new(config.ssh_timeout()));
        let activity = Arc::new(FileActivityLog::new(&config.activity_dir()));

        Ok(Self::build(Some(config_path), config, inventory, transport, activity))
    }

    /// Assemble state from already-built parts; nothing is read from disk.
    pub fn from_parts(
        config: Config,
        inventory: Inventory,
        transport: Arc<dyn Transport>,
        activity: Arc<dyn ActivitySink>,
    ) -> Self {
        Self::build(None, config, inventory, transport, activity)
    }

    fn build(
        config_path: Option<PathBuf>,
        config: Config,
        inventory: Inventory,
        transport: Arc<dyn Transport>,
        activity: Arc<dyn ActivitySink>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config_path,
                config: RwLock::new(Arc::new(config)),
                inventory: RwLock::new(Arc::new(inventory)),
                transport,
                activity,
            }),
        }
    }

    pub async fn config(&self) -> Arc<Config> {
        self.inner.config.read().await.clone()
    }

    pub async fn inventory(&self) -> Arc<Inventory> {
        self.inner.inventory.read().await.clone()
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        self.inner.transport.clone()
    }

    pub fn activity(&self) -> &dyn ActivitySink {
        self.inner.activity.as_ref()
    }

    /// Re-read the config file and servers.json.
    ///
    /// The SSH timeout and log directory are fixed at startup.
    pub async fn reload(&self) -> Result<(), AppError> {
        let Some(path) = &self.inner.config_path else {
            return Ok(());
        };
        let config = Config::load(path)?;
        let inventory = Inventory::load(&config.servers_path)?;
        tracing::info!(
            "Reloaded {:?}: {} server(s) from {:?}",
            path,
            inventory.servers().len(),
            config.servers_path
        );

        *self.inner.inventory.write().await = Arc::new(inventory);
        *self.inner.config.write().await = Arc::new(config);
        Ok(())
    }
}
