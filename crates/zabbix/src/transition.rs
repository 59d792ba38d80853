//! Take a resolved host out of active monitoring.
//!
//! Two policies, chosen once per process:
//! - **Disable** (default): rename the host with [`PENDING_PURGE_PREFIX`],
//!   set it to not monitored and record an audit annotation, in one
//!   `host.update`.
//! - **Delete**: one `host.delete`.
//!
//! A host whose name already carries the prefix is left alone, so a replayed
//! notification has no further effect. The check and the update are two
//! separate calls; two concurrent deliveries for the same instance can both
//! pass the check.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use asg_events::InstanceTerminationEvent;

use crate::error::ZabbixError;
use crate::inventory::{HostRecord, HostUpdate, Inventory, HOST_STATUS_NOT_MONITORED};

/// Host-name prefix marking a host as disabled and pending purge.
pub const PENDING_PURGE_PREFIX: &str = "ZDTP_";

/// Trigger recorded when the event carries none.
const DEFAULT_TRIGGER: &str = "autoscaling:EC2_INSTANCE_TERMINATE";

pub fn is_pending_purge(host_name: &str) -> bool {
    host_name.starts_with(PENDING_PURGE_PREFIX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    #[default]
    Disable,
    Delete,
}

impl TransitionPolicy {
    pub fn from_delete_mode(delete_mode: bool) -> Self {
        if delete_mode { Self::Delete } else { Self::Disable }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disable => "disable",
            Self::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransitionOutcome {
    Disabled { host_id: String, new_name: String },
    Deleted { host_id: String },
    /// The host was already marked; no call was made.
    AlreadyTransitioned { host_id: String },
}

/// Audit record stored in the description of a disabled host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionAnnotation {
    pub transitioned_at: String,
    pub action: String,
    pub trigger: String,
    pub previous_host: String,
    /// Description the annotation replaced, if there was one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_description: Option<String>,
    pub instance_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoscaling_group: Option<String>,
}

impl TransitionAnnotation {
    pub fn new(host: &HostRecord, event: &InstanceTerminationEvent, at: DateTime<Utc>) -> Self {
        Self {
            transitioned_at: at.to_rfc3339_opts(SecondsFormat::Secs, true),
            action: TransitionPolicy::Disable.as_str().to_string(),
            trigger: event
                .trigger
                .clone()
                .unwrap_or_else(|| DEFAULT_TRIGGER.to_string()),
            previous_host: host.host_name.clone(),
            previous_description: host.description.clone(),
            instance_id: event.instance_id.clone(),
            autoscaling_group: event.autoscaling_group_name.clone(),
        }
    }

    /// JSON text as written to the host description.
    pub fn to_description(&self) -> String {
        // Plain strings only; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Applies a [`TransitionPolicy`] to resolved hosts.
pub struct HostTransitioner<'a> {
    inventory: &'a dyn Inventory,
    policy: TransitionPolicy,
}

impl<'a> HostTransitioner<'a> {
    pub fn new(inventory: &'a dyn Inventory, policy: TransitionPolicy) -> Self {
        Self { inventory, policy }
    }

    /// Transition `host`, which was resolved for `event`.
    ///
    /// Issues at most one mutating call. Errors from that call are returned
    /// unchanged; the host is then presumed untouched.
    pub async fn transition(
        &self,
        host: &HostRecord,
        event: &InstanceTerminationEvent,
    ) -> Result<TransitionOutcome, ZabbixError> {
        if is_pending_purge(&host.host_name) {
            info!(host_id = %host.host_id, host = %host.host_name, "Host already updated, skipping");
            return Ok(TransitionOutcome::AlreadyTransitioned {
                host_id: host.host_id.clone(),
            });
        }

        match self.policy {
            TransitionPolicy::Delete => {
                info!(host_id = %host.host_id, host = %host.host_name, "Deleting zabbix host");
                self.inventory.delete_host(&host.host_id).await?;
                Ok(TransitionOutcome::Deleted {
                    host_id: host.host_id.clone(),
                })
            }
            TransitionPolicy::Disable => {
                let update = disable_update(host, event, Utc::now());
                info!(
                    host_id = %host.host_id,
                    host = %host.host_name,
                    new_name = %update.host_name,
                    "Disabling zabbix host"
                );
                self.inventory.update_host(&update).await?;
                Ok(TransitionOutcome::Disabled {
                    host_id: update.host_id,
                    new_name: update.host_name,
                })
            }
        }
    }
}

/// Build the `host.update` that disables and marks `host`.
pub fn disable_update(
    host: &HostRecord,
    event: &InstanceTerminationEvent,
    at: DateTime<Utc>,
) -> HostUpdate {
    let new_name = format!("{PENDING_PURGE_PREFIX}{}", host.host_name);
    HostUpdate {
        host_id: host.host_id.clone(),
        host_name: new_name.clone(),
        display_name: new_name,
        description: TransitionAnnotation::new(host, event, at).to_description(),
        status: HOST_STATUS_NOT_MONITORED,
    }
}
