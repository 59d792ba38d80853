//! SNS envelope and the lifecycle payload shapes it may carry.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::EventError;

/// Keys that identify a bare lifecycle detail object.
const FLAT_KEYS: &[&str] = &["EC2InstanceId", "AutoScalingGroupName", "Event"];

/// SNS notification as delivered to the handler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnsEnvelope {
    #[serde(rename = "Records", default)]
    pub records: Vec<SnsRecord>,
}

impl SnsEnvelope {
    /// Parse a raw SNS event document.
    pub fn from_json(raw: &str) -> Result<Self, EventError> {
        serde_json::from_str(raw)
            .map_err(|e| EventError::Parse(format!("Invalid SNS envelope: {e}")))
    }

    /// Envelope with a single record carrying `message`.
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            records: vec![SnsRecord {
                event_source: Some("aws:sns".into()),
                sns: SnsMessage {
                    message: message.into(),
                    ..SnsMessage::default()
                },
                ..SnsRecord::default()
            }],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SnsRecord {
    #[serde(default)]
    pub event_source: Option<String>,
    #[serde(default)]
    pub event_version: Option<String>,
    #[serde(default)]
    pub event_subscription_arn: Option<String>,
    pub sns: SnsMessage,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SnsMessage {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub topic_arn: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    /// JSON-encoded inner payload.
    pub message: String,
}

/// CloudWatch / EventBridge event wrapping a lifecycle detail.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudWatchEvent {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "detail-type", default)]
    pub detail_type: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    pub detail: LifecycleDetail,
}

/// Autoscaling lifecycle fields. Everything is optional at this layer;
/// [`crate::lifecycle::parse_lifecycle`] enforces the instance id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleDetail {
    #[serde(rename = "EC2InstanceId", default)]
    pub ec2_instance_id: Option<String>,
    #[serde(default)]
    pub auto_scaling_group_name: Option<String>,
    #[serde(default)]
    pub cause: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub status_code: Option<String>,
    /// Only present in the flat notification form, e.g. `autoscaling:EC2_INSTANCE_TERMINATE`.
    #[serde(default)]
    pub event: Option<String>,
}

/// The inner message of an SNS record, by shape.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "shape", content = "payload", rename_all = "snake_case")]
pub enum LifecyclePayload {
    /// `{source, detail-type, detail: {...}}`.
    Wrapped(CloudWatchEvent),
    /// The lifecycle detail object on its own.
    Flat(LifecycleDetail),
}

/// Decode the first record of `envelope` into a [`LifecyclePayload`].
pub fn decode_envelope(envelope: &SnsEnvelope) -> Result<LifecyclePayload, EventError> {
    let record = envelope.records.first().ok_or(EventError::NoRecords)?;

    if envelope.records.len() > 1 {
        warn!(
            records = envelope.records.len(),
            "SNS envelope has more than one record, only the first is handled"
        );
    }

    debug!(
        message_id = record.sns.message_id.as_deref().unwrap_or("unknown"),
        topic = record.sns.topic_arn.as_deref().unwrap_or("unknown"),
        "Decoding SNS record"
    );

    decode_message(&record.sns.message)
}

/// Parse a raw SNS envelope document and decode its first record.
pub fn decode_envelope_str(raw: &str) -> Result<LifecyclePayload, EventError> {
    decode_envelope(&SnsEnvelope::from_json(raw)?)
}

fn decode_message(message: &str) -> Result<LifecyclePayload, EventError> {
    let json: Value = serde_json::from_str(message)
        .map_err(|e| EventError::Parse(format!("Invalid JSON in SNS message: {e}")))?;

    let obj = match json {
        Value::Object(obj) => obj,
        _ => return Err(EventError::Parse("SNS message is not a JSON object".into())),
    };

    if obj.contains_key("detail") {
        let event: CloudWatchEvent = serde_json::from_value(Value::Object(obj))
            .map_err(|e| EventError::Parse(format!("Invalid CloudWatch event: {e}")))?;
        return Ok(LifecyclePayload::Wrapped(event));
    }

    if FLAT_KEYS.iter().any(|k| obj.contains_key(*k)) {
        let detail: LifecycleDetail = serde_json::from_value(Value::Object(obj))
            .map_err(|e| EventError::Parse(format!("Invalid lifecycle detail: {e}")))?;
        return Ok(LifecyclePayload::Flat(detail));
    }

    Err(EventError::UnrecognizedShape(key_list(&obj)))
}

fn key_list(obj: &Map<String, Value>) -> String {
    if obj.is_empty() {
        return "none".into();
    }
    obj.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}
