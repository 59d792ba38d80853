//! Zabbix API error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ZabbixError {
    /// The request never produced an HTTP response (DNS, TLS, timeout, ...).
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Zabbix API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The API answered with a JSON-RPC `error` object.
    #[error("{method} failed: {message} ({code}){}", detail_suffix(.data))]
    Rpc {
        method: String,
        code: i64,
        message: String,
        data: Option<String>,
    },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("not authenticated, call authenticate() first")]
    NotAuthenticated,

    #[error("unexpected response to {method}: {reason}")]
    Decode { method: String, reason: String },

    #[error("invalid Zabbix URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

fn detail_suffix(data: &Option<String>) -> String {
    match data.as_deref() {
        Some(d) if !d.is_empty() => format!(": {d}"),
        _ => String::new(),
    }
}
