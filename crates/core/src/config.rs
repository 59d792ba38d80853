use std::env;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::secrets::SecretDecryptor;

/// Default per-request timeout for Zabbix API calls.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_required(profile: &str, key: &'static str) -> Result<String, ConfigError> {
    profiled_env_opt(profile, key).ok_or(ConfigError::Missing(key))
}

fn profiled_env_bool(profile: &str, key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match profiled_env_opt(profile, key) {
        Some(v) => parse_bool(&v).ok_or(ConfigError::InvalidBool { key, value: v }),
        None => Ok(default),
    }
}

fn profiled_env_u64(profile: &str, key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match profiled_env_opt(profile, key) {
        Some(v) => v.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value: v,
        }),
        None => Ok(default),
    }
}

/// Parse the boolean spellings accepted by the deployment tooling
/// (`1`, `t`, `true`, `0`, `f`, `false` in lower, upper or title case).
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

// ── Config ────────────────────────────────────────────────────

/// Resolved handler settings.
///
/// Built once per process by [`Config::from_env`] and handed to every
/// invocation by reference. Never mutated after initialization, apart from
/// the one-shot [`Config::decrypt_credentials`] step that consumes `self`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    /// Zabbix JSON-RPC endpoint.
    pub zabbix_url: String,
    pub zabbix_user: String,
    #[serde(skip_serializing)]
    pub zabbix_password: String,
    /// Delete matched hosts instead of disabling and renaming them.
    pub delete_mode: bool,
    /// Verbose logging of envelopes and decoded payloads.
    pub debug: bool,
    /// User and password hold base64 KMS ciphertext.
    pub credentials_encrypted: bool,
    pub aws_region: String,
    pub request_timeout_secs: u64,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `ASG_PROFILE`. When set (e.g. `PROD`), every key is
    /// first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let profile = env_opt("ASG_PROFILE").unwrap_or_default().to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Result<Self, ConfigError> {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Ok(Self {
            profile: p.to_string(),
            zabbix_url: profiled_env_required(p, "ZABBIX_URL")?,
            zabbix_user: profiled_env_required(p, "ZABBIX_USER")?,
            zabbix_password: profiled_env_required(p, "ZABBIX_PASS")?,
            delete_mode: profiled_env_bool(p, "DELETING_HOST", false)?,
            debug: profiled_env_bool(p, "DEBUG", false)?,
            credentials_encrypted: profiled_env_bool(p, "ZABBIX_CREDENTIALS_ENCRYPTED", false)?,
            aws_region: profiled_env_opt(p, "AWS_REGION")
                .unwrap_or_else(|| DEFAULT_AWS_REGION.to_string()),
            request_timeout_secs: profiled_env_u64(p, "ZABBIX_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
        })
    }

    /// Replace encrypted credentials with their plaintext.
    ///
    /// No-op when `credentials_encrypted` is false.
    pub async fn decrypt_credentials(
        mut self,
        decryptor: &dyn SecretDecryptor,
    ) -> Result<Self, ConfigError> {
        if !self.credentials_encrypted {
            return Ok(self);
        }
        self.zabbix_user = decryptor.decrypt("ZABBIX_USER", &self.zabbix_user).await?;
        self.zabbix_password = decryptor.decrypt("ZABBIX_PASS", &self.zabbix_password).await?;
        self.credentials_encrypted = false;
        tracing::debug!("zabbix credentials decrypted");
        Ok(self)
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  zabbix:  url={}, user={}", self.zabbix_url, self.redacted_user());
        tracing::info!(
            "  mode:    {}",
            if self.delete_mode { "delete" } else { "disable" }
        );
        tracing::info!(
            "  runtime: debug={}, timeout={}s, region={}",
            self.debug,
            self.request_timeout_secs,
            self.aws_region
        );
    }

    fn redacted_user(&self) -> &str {
        if self.credentials_encrypted { "(encrypted)" } else { &self.zabbix_user }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("profile", &self.profile)
            .field("zabbix_url", &self.zabbix_url)
            .field("zabbix_user", &self.redacted_user())
            .field("zabbix_password", &"***")
            .field("delete_mode", &self.delete_mode)
            .field("debug", &self.debug)
            .field("credentials_encrypted", &self.credentials_encrypted)
            .field("aws_region", &self.aws_region)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}
