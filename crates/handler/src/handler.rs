//! One invocation: envelope in, result string or error out.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use asg_core::Config;
use asg_events::{decode_envelope, parse_lifecycle, SnsEnvelope};
use asg_zabbix::{
    HostTransitioner, Inventory, InventoryResolver, TransitionDecision, TransitionOutcome,
    TransitionPolicy,
};

use crate::error::HandlerError;

pub const HOST_NOT_FOUND: &str = "host not found";
pub const HOST_ALREADY_UPDATED: &str = "host already updated";

/// Successful end states of an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum HandlerOutcome {
    /// The host was disabled and marked, or deleted.
    Deregistered {
        instance_id: String,
        transition: TransitionOutcome,
    },
    /// No host carries the instance alias.
    HostNotFound { instance_id: String },
    /// The host was handled by an earlier delivery.
    AlreadyUpdated { instance_id: String, host_id: String },
}

impl HandlerOutcome {
    /// The result string returned to the invoker.
    pub fn message(&self) -> &str {
        match self {
            Self::Deregistered { instance_id, .. } => instance_id.as_str(),
            Self::HostNotFound { .. } => HOST_NOT_FOUND,
            Self::AlreadyUpdated { .. } => HOST_ALREADY_UPDATED,
        }
    }
}

impl fmt::Display for HandlerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Runs the deregistration flow against an [`Inventory`].
///
/// The transition policy is fixed from `config` at construction. The handler
/// keeps no state between invocations; it can be reused for any number of
/// envelopes while the config stays warm.
pub struct Handler<'a> {
    config: &'a Config,
    inventory: &'a dyn Inventory,
    policy: TransitionPolicy,
}

impl<'a> Handler<'a> {
    pub fn new(config: &'a Config, inventory: &'a dyn Inventory) -> Self {
        Self {
            config,
            inventory,
            policy: TransitionPolicy::from_delete_mode(config.delete_mode),
        }
    }

    /// Handle a raw SNS event document.
    pub async fn handle_json(&self, raw: &str) -> Result<HandlerOutcome, HandlerError> {
        self.handle(&SnsEnvelope::from_json(raw)?).await
    }

    /// Handle one SNS envelope.
    ///
    /// Parses before touching the network, authenticates once, resolves the
    /// host, then issues at most one mutating call.
    pub async fn handle(&self, envelope: &SnsEnvelope) -> Result<HandlerOutcome, HandlerError> {
        if self.config.debug {
            debug!(envelope = %to_json(envelope), "Catching SNS event");
        }

        let payload = decode_envelope(envelope)?;
        if self.config.debug {
            debug!(payload = %to_json(&payload), "Decoded lifecycle payload");
        }

        let event = parse_lifecycle(payload)?;
        let instance_id = event.instance_id.clone();
        if !event.is_termination() {
            warn!(
                instance_id = %instance_id,
                trigger = event.trigger.as_deref().unwrap_or(""),
                "Lifecycle event is not a termination, handling it anyway"
            );
        }

        info!(instance_id = %instance_id, policy = self.policy.as_str(), "Handling termination");

        self.inventory
            .authenticate(&self.config.zabbix_user, &self.config.zabbix_password)
            .await
            .map_err(HandlerError::Resolution)?;

        let decision = InventoryResolver::new(self.inventory)
            .resolve(&instance_id)
            .await
            .map_err(HandlerError::Resolution)?;

        let host = match decision {
            TransitionDecision::NotFound => {
                return Ok(HandlerOutcome::HostNotFound { instance_id });
            }
            TransitionDecision::Ambiguous { count } => {
                return Err(HandlerError::AmbiguousMatch { instance_id, count });
            }
            TransitionDecision::AlreadyTransitioned(host) => {
                return Ok(HandlerOutcome::AlreadyUpdated {
                    instance_id,
                    host_id: host.host_id,
                });
            }
            TransitionDecision::Actionable(host) => host,
        };

        let transition = HostTransitioner::new(self.inventory, self.policy)
            .transition(&host, &event)
            .await
            .map_err(|source| HandlerError::Transition {
                host_id: host.host_id.clone(),
                source,
            })?;

        let outcome = match transition {
            TransitionOutcome::AlreadyTransitioned { host_id } => {
                HandlerOutcome::AlreadyUpdated { instance_id, host_id }
            }
            transition => HandlerOutcome::Deregistered { instance_id, transition },
        };

        info!("Function finished successfully");
        Ok(outcome)
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<unserializable: {e}>"))
}
