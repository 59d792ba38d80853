//! Decoding of autoscaling termination notifications.
//!
//! An invocation receives an SNS envelope whose first record carries a JSON
//! message. That message is either a CloudWatch/EventBridge event wrapping the
//! lifecycle detail, or the lifecycle detail itself. Both normalize to a single
//! [`InstanceTerminationEvent`].

pub mod envelope;
pub mod error;
pub mod lifecycle;

pub use envelope::{
    decode_envelope, decode_envelope_str, CloudWatchEvent, LifecycleDetail, LifecyclePayload,
    SnsEnvelope, SnsMessage, SnsRecord,
};
pub use error::EventError;
pub use lifecycle::{parse_event, parse_lifecycle, InstanceTerminationEvent};
