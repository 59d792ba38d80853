//! Look up the host registered for an instance and classify the result.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ZabbixError;
use crate::inventory::{HostRecord, Inventory};
use crate::transition::is_pending_purge;

/// What to do with the hosts found for an instance id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum TransitionDecision {
    /// No host carries the alias. Nothing to do.
    NotFound,
    /// More than one host carries the alias. Never guess which one to touch.
    Ambiguous { count: usize },
    /// The only match is already marked pending purge.
    AlreadyTransitioned(HostRecord),
    /// The only match is still active.
    Actionable(HostRecord),
}

impl TransitionDecision {
    /// Classify a query result set.
    pub fn classify(mut hosts: Vec<HostRecord>) -> Self {
        match hosts.len() {
            0 => Self::NotFound,
            1 => {
                let host = hosts.remove(0);
                if is_pending_purge(&host.host_name) {
                    Self::AlreadyTransitioned(host)
                } else {
                    Self::Actionable(host)
                }
            }
            count => Self::Ambiguous { count },
        }
    }

    pub fn host(&self) -> Option<&HostRecord> {
        match self {
            Self::AlreadyTransitioned(host) | Self::Actionable(host) => Some(host),
            Self::NotFound | Self::Ambiguous { .. } => None,
        }
    }
}

/// Resolves instance ids against an [`Inventory`].
pub struct InventoryResolver<'a> {
    inventory: &'a dyn Inventory,
}

impl<'a> InventoryResolver<'a> {
    pub fn new(inventory: &'a dyn Inventory) -> Self {
        Self { inventory }
    }

    /// Query the hosts whose inventory alias is `instance_id` and classify them.
    ///
    /// The inventory search matches substrings, so hosts whose alias is
    /// present but differs from `instance_id` (`i-12` vs `i-123`) are dropped
    /// before counting. Errors from the inventory are returned unchanged.
    pub async fn resolve(&self, instance_id: &str) -> Result<TransitionDecision, ZabbixError> {
        info!(instance_id, "Getting zabbix host corresponding to instance");

        let found = self.inventory.find_hosts_by_alias(instance_id).await?;
        let total = found.len();
        let hosts: Vec<HostRecord> = found
            .into_iter()
            .filter(|h| h.inventory_alias.as_deref().map_or(true, |a| a == instance_id))
            .collect();

        if hosts.len() != total {
            debug!(
                instance_id,
                dropped = total - hosts.len(),
                "Ignoring hosts whose alias only partially matches"
            );
        }

        let decision = TransitionDecision::classify(hosts);
        match &decision {
            TransitionDecision::NotFound => {
                info!(instance_id, "Zabbix host not found for instance, do nothing")
            }
            TransitionDecision::Ambiguous { count } => {
                warn!(instance_id, count, "More than one host found for instance, do nothing")
            }
            TransitionDecision::AlreadyTransitioned(host) => info!(
                instance_id,
                host_id = %host.host_id,
                host = %host.host_name,
                "Zabbix host already marked for purge, do nothing"
            ),
            TransitionDecision::Actionable(host) => debug!(
                instance_id,
                host_id = %host.host_id,
                host = %host.host_name,
                "Zabbix host resolved"
            ),
        }
        Ok(decision)
    }
}
