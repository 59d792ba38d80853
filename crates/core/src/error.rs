use thiserror::Error;

/// Errors raised while building the handler configuration.
///
/// All of these are fatal: the invocation aborts before any event is parsed.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("invalid boolean value {value:?} for {key}")]
    InvalidBool { key: &'static str, value: String },

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("secret decryption failed for {key}: {reason}")]
    Decrypt { key: &'static str, reason: String },
}
