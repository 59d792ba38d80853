//! Invocation-level error types.

use asg_events::EventError;
use asg_zabbix::ZabbixError;

/// Why an invocation failed. "Host not found" and "already updated" are not
/// errors; see [`crate::HandlerOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Envelope or lifecycle payload malformed. Nothing was called.
    #[error("cannot parse notification: {0}")]
    Parse(#[from] EventError),

    /// Login or host lookup failed. Nothing was mutated.
    #[error("cannot resolve zabbix host: {0}")]
    Resolution(#[source] ZabbixError),

    /// Several hosts carry the instance alias. Nothing was mutated.
    #[error("more than one hosts found for instance {instance_id} ({count} matches)")]
    AmbiguousMatch { instance_id: String, count: usize },

    /// The update or delete call failed; the host is presumed unchanged.
    #[error("cannot transition zabbix host {host_id}: {source}")]
    Transition {
        host_id: String,
        #[source]
        source: ZabbixError,
    },
}
