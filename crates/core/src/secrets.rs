//! Decryption of credentials that arrive as KMS ciphertext.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_kms::primitives::Blob;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use crate::error::ConfigError;

/// Turns an encrypted configuration value into plaintext.
#[async_trait]
pub trait SecretDecryptor: Send + Sync {
    /// Decrypt `ciphertext`. `key` names the setting, for error messages only.
    async fn decrypt(&self, key: &'static str, ciphertext: &str) -> Result<String, ConfigError>;
}

/// [`SecretDecryptor`] backed by AWS KMS.
///
/// Values are expected as base64 text, the form the console and CLI produce
/// for encrypted Lambda environment variables.
pub struct KmsDecryptor {
    client: aws_sdk_kms::Client,
}

impl KmsDecryptor {
    /// Build a KMS client for `region` from the default credential chain.
    pub async fn new(region: &str) -> Self {
        let region = aws_sdk_kms::config::Region::new(region.to_string());
        let aws_cfg = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await;
        Self {
            client: aws_sdk_kms::Client::new(&aws_cfg),
        }
    }
}

#[async_trait]
impl SecretDecryptor for KmsDecryptor {
    async fn decrypt(&self, key: &'static str, ciphertext: &str) -> Result<String, ConfigError> {
        let blob = decode_ciphertext(key, ciphertext)?;

        debug!(key, bytes = blob.len(), "Decrypting secret with KMS");

        let resp = self
            .client
            .decrypt()
            .ciphertext_blob(Blob::new(blob))
            .send()
            .await
            .map_err(|e| ConfigError::Decrypt {
                key,
                reason: format!("KMS decrypt failed: {e:?}"),
            })?;

        let plaintext = resp.plaintext().ok_or_else(|| ConfigError::Decrypt {
            key,
            reason: "KMS returned no plaintext".into(),
        })?;

        String::from_utf8(plaintext.as_ref().to_vec()).map_err(|e| ConfigError::Decrypt {
            key,
            reason: format!("plaintext is not UTF-8: {e}"),
        })
    }
}

fn decode_ciphertext(key: &'static str, ciphertext: &str) -> Result<Vec<u8>, ConfigError> {
    STANDARD
        .decode(ciphertext.trim())
        .map_err(|e| ConfigError::Decrypt {
            key,
            reason: format!("ciphertext is not valid base64: {e}"),
        })
}
