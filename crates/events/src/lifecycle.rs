//! Normalize a [`LifecyclePayload`] into an [`InstanceTerminationEvent`].

use serde::{Deserialize, Serialize};

use crate::envelope::{decode_envelope, LifecycleDetail, LifecyclePayload, SnsEnvelope};
use crate::error::EventError;

/// Canonical termination event. Only `instance_id` drives decisions; the rest
/// is carried for logging and the audit annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceTerminationEvent {
    pub instance_id: String,
    pub autoscaling_group_name: Option<String>,
    pub cause: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub status_code: Option<String>,
    /// `detail-type` of a wrapped event, or `Event` of a flat one.
    pub trigger: Option<String>,
    pub source: Option<String>,
    pub account: Option<String>,
    pub region: Option<String>,
    pub time: Option<String>,
}

impl InstanceTerminationEvent {
    /// Whether the trigger names a termination. Events without a trigger are
    /// assumed to be terminations.
    pub fn is_termination(&self) -> bool {
        self.trigger
            .as_deref()
            .map_or(true, |t| t.to_ascii_lowercase().contains("terminate"))
    }
}

/// Build the canonical event from either payload shape.
///
/// Fails with [`EventError::MissingInstanceId`] when `EC2InstanceId` is absent
/// or blank. A non-blank identifier is carried exactly as received.
pub fn parse_lifecycle(payload: LifecyclePayload) -> Result<InstanceTerminationEvent, EventError> {
    match payload {
        LifecyclePayload::Wrapped(event) => {
            let mut parsed = from_detail(event.detail, event.detail_type)?;
            parsed.source = event.source;
            parsed.account = event.account;
            parsed.region = event.region;
            parsed.time = event.time;
            Ok(parsed)
        }
        LifecyclePayload::Flat(mut detail) => {
            let trigger = detail.event.take();
            from_detail(detail, trigger)
        }
    }
}

/// Decode the envelope and parse its lifecycle payload in one step.
pub fn parse_event(envelope: &SnsEnvelope) -> Result<InstanceTerminationEvent, EventError> {
    parse_lifecycle(decode_envelope(envelope)?)
}

fn from_detail(
    detail: LifecycleDetail,
    trigger: Option<String>,
) -> Result<InstanceTerminationEvent, EventError> {
    let instance_id = detail
        .ec2_instance_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(EventError::MissingInstanceId)?;

    Ok(InstanceTerminationEvent {
        instance_id,
        autoscaling_group_name: detail.auto_scaling_group_name,
        cause: detail.cause,
        description: detail.description,
        start_time: detail.start_time,
        end_time: detail.end_time,
        status_code: detail.status_code,
        trigger,
        source: None,
        account: None,
        region: None,
        time: None,
    })
}
