pub mod config;
pub mod error;
pub mod secrets;

pub use config::Config;
pub use error::ConfigError;
pub use secrets::{KmsDecryptor, SecretDecryptor};
