//! Server inventory loaded from servers.json.
//!
//! Older records put `ipPrefix` and `typeDescriptions` on the server itself;
//! newer ones list named subnets. Both shapes are resolved into
//! [`ServerLayout`] when the file is loaded so nothing downstream has to
//! check which fields happen to be present.

use std::path::Path;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use super::DeviceTypeMap;

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("Failed to read server inventory {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid server inventory: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Server '{0}' has neither an ipPrefix nor subnets")]
    MissingLayout(String),

    #[error("Unknown server: {0}")]
    UnknownServer(String),

    #[error("Server '{server}' has no subnet named '{subnet}'")]
    UnknownSubnet { server: String, subnet: String },
}

/// A named address block with its own classification table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    pub name: String,
    pub ip_prefix: String,
    #[serde(default)]
    pub type_descriptions: DeviceTypeMap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerLayout {
    /// Single prefix; type octets form the third address component.
    Legacy {
        ip_prefix: String,
        type_descriptions: DeviceTypeMap,
    },
    /// One or more named subnets.
    Subnets(Vec<Subnet>),
}

/// A DHCP server reachable over SSH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    pub name: String,
    pub host: String,
    pub layout: ServerLayout,
}

/// Prefix and classification table to use for one request.
#[derive(Debug, Clone, Copy)]
pub struct AddressScope<'a> {
    pub ip_prefix: &'a str,
    pub type_descriptions: &'a DeviceTypeMap,
}

impl Server {
    /// Resolve the address scope, defaulting to the first subnet.
    pub fn scope(&self, subnet: Option<&str>) -> Result<AddressScope<'_>, InventoryError> {
        match &self.layout {
            ServerLayout::Legacy {
                ip_prefix,
                type_descriptions,
            } => Ok(AddressScope {
                ip_prefix,
                type_descriptions,
            }),
            ServerLayout::Subnets(subnets) => {
                let found = match subnet {
                    Some(name) => subnets.iter().find(|s| s.name == name),
                    None => subnets.first(),
                };
                let subnet = found.ok_or_else(|| InventoryError::UnknownSubnet {
                    server: self.name.clone(),
                    subnet: subnet.unwrap_or_default().to_string(),
                })?;
                Ok(AddressScope {
                    ip_prefix: &subnet.ip_prefix,
                    type_descriptions: &subnet.type_descriptions,
                })
            }
        }
    }
}

/// servers.json record as written on disk.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerRecord {
    name: String,
    host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ip_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    type_descriptions: Option<DeviceTypeMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subnets: Option<Vec<Subnet>>,
}

impl TryFrom<ServerRecord> for Server {
    type Error = InventoryError;

    fn try_from(record: ServerRecord) -> Result<Self, Self::Error> {
        let layout = match (record.subnets, record.ip_prefix) {
            (Some(subnets), _) if !subnets.is_empty() => ServerLayout::Subnets(subnets),
            (_, Some(ip_prefix)) => ServerLayout::Legacy {
                ip_prefix,
                type_descriptions: record.type_descriptions.unwrap_or_default(),
            },
            _ => return Err(InventoryError::MissingLayout(record.name)),
        };

        Ok(Server {
            name: record.name,
            host: record.host,
            layout,
        })
    }
}

impl From<&Server> for ServerRecord {
    fn from(server: &Server) -> Self {
        let (ip_prefix, type_descriptions, subnets) = match &server.layout {
            ServerLayout::Legacy {
                ip_prefix,
                type_descriptions,
            } => (Some(ip_prefix.clone()), Some(type_descriptions.clone()), None),
            ServerLayout::Subnets(subnets) => (None, None, Some(subnets.clone())),
        };
        ServerRecord {
            name: server.name.clone(),
            host: server.host.clone(),
            ip_prefix,
            type_descriptions,
            subnets,
        }
    }
}

impl Serialize for Server {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ServerRecord::from(self).serialize(serializer)
    }
}

/// All servers the dashboard may talk to.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Inventory {
    servers: Vec<Server>,
}

impl Inventory {
    pub fn new(servers: Vec<Server>) -> Self {
        Self { servers }
    }

    /// Load servers.json. A missing file yields an empty inventory.
    pub fn load(path: &Path) -> Result<Self, InventoryError> {
        if !path.exists() {
            tracing::warn!("Server inventory {:?} not found, starting with no servers", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| InventoryError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, InventoryError> {
        let records: Vec<ServerRecord> = serde_json::from_str(content)?;
        let servers = records
            .into_iter()
            .map(Server::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { servers })
    }

    /// Look up a server by SSH host.
    pub fn find(&self, host: &str) -> Result<&Server, InventoryError> {
        self.servers
            .iter()
            .find(|s| s.host == host)
            .ok_or_else(|| InventoryError::UnknownServer(host.to_string()))
    }

    pub fn servers(&self) -> &[Server] {
        &self.servers
    }
}
