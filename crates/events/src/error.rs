//! Event decoding error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("message parse error: {0}")]
    Parse(String),

    #[error("envelope contains no records")]
    NoRecords,

    #[error("unrecognized lifecycle payload shape (keys: {0})")]
    UnrecognizedShape(String),

    #[error("lifecycle payload has no EC2InstanceId")]
    MissingInstanceId,
}
