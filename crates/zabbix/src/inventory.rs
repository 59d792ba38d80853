//! The inventory operations the handler relies on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ZabbixError;

/// Zabbix host `status` value for "not monitored".
pub const HOST_STATUS_NOT_MONITORED: u8 = 1;

/// A host as returned by the alias query. Read-only snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub host_id: String,
    /// Technical host name (`host` in the API).
    pub host_name: String,
    /// Inventory `alias`, `None` when the host has no inventory.
    pub inventory_alias: Option<String>,
    /// Free-text description; replaced by the audit annotation on disable.
    pub description: Option<String>,
}

impl HostRecord {
    pub fn new(host_id: impl Into<String>, host_name: impl Into<String>) -> Self {
        Self {
            host_id: host_id.into(),
            host_name: host_name.into(),
            inventory_alias: None,
            description: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.inventory_alias = Some(alias.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Parameters of the single `host.update` issued when disabling a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostUpdate {
    #[serde(rename = "hostid")]
    pub host_id: String,
    /// New technical name.
    #[serde(rename = "host")]
    pub host_name: String,
    /// New visible name.
    #[serde(rename = "name")]
    pub display_name: String,
    /// Audit annotation, stored in the host description.
    pub description: String,
    pub status: u8,
}

/// Remote inventory of monitored hosts.
///
/// Implementations own transport and session handling. Every method is a
/// single remote call; nothing is retried.
#[async_trait]
pub trait Inventory: Send + Sync {
    /// Open a session. Must succeed before any other call.
    async fn authenticate(&self, user: &str, password: &str) -> Result<(), ZabbixError>;

    /// Hosts whose inventory alias matches `alias`.
    async fn find_hosts_by_alias(&self, alias: &str) -> Result<Vec<HostRecord>, ZabbixError>;

    async fn update_host(&self, update: &HostUpdate) -> Result<(), ZabbixError>;

    async fn delete_host(&self, host_id: &str) -> Result<(), ZabbixError>;
}
