//! JSON-RPC client for the Zabbix API.
//!
//! Provides [`ZabbixClient`], an [`Inventory`] over HTTP. One client serves one
//! invocation: it logs in once and reuses the session token for the read and
//! the mutating call that follow.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::ZabbixError;
use crate::inventory::{HostRecord, HostUpdate, Inventory};

const API_PATH: &str = "api_jsonrpc.php";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    method: &'a str,
    params: P,
    id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawHost {
    hostid: String,
    host: String,
    #[serde(default)]
    description: Option<String>,
    /// An object when the host has inventory, `[]` otherwise.
    #[serde(default)]
    inventory: Value,
}

impl From<RawHost> for HostRecord {
    fn from(raw: RawHost) -> Self {
        let inventory_alias = raw
            .inventory
            .get("alias")
            .and_then(Value::as_str)
            .map(str::to_string);
        Self {
            host_id: raw.hostid,
            host_name: raw.host,
            inventory_alias,
            description: raw.description.filter(|d| !d.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct HostIds {
    #[serde(default)]
    hostids: Vec<Value>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Zabbix JSON-RPC client.
pub struct ZabbixClient {
    endpoint: String,
    client: reqwest::Client,
    /// Session token from `user.login`.
    auth: RwLock<Option<String>>,
    next_id: AtomicU64,
}

impl ZabbixClient {
    /// Create a client for `url` with a per-request `timeout`.
    ///
    /// `url` may be a bare host (`zabbix.example.com`) or a full endpoint; a
    /// missing scheme defaults to `https://` and a missing `api_jsonrpc.php`
    /// path is appended.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, ZabbixError> {
        let endpoint = normalize_endpoint(url)?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        debug!(endpoint = %endpoint, timeout_secs = timeout.as_secs(), "Zabbix client created");

        Ok(Self {
            endpoint,
            client,
            auth: RwLock::new(None),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Issue an authenticated call.
    async fn call<P, R>(&self, method: &str, params: P) -> Result<R, ZabbixError>
    where
        P: Serialize + Send,
        R: DeserializeOwned + Send,
    {
        let auth = self.auth.read().await.clone().ok_or(ZabbixError::NotAuthenticated)?;
        self.send(method, params, Some(&auth)).await
    }

    async fn send<P, R>(&self, method: &str, params: P, auth: Option<&str>) -> Result<R, ZabbixError>
    where
        P: Serialize + Send,
        R: DeserializeOwned + Send,
    {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            auth,
        };

        debug!(method, id = request.id, "Calling Zabbix API");

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json-rpc")
            .json(&request)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            warn!(method, %status, body = %body, "Zabbix API returned non-2xx status");
            return Err(ZabbixError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body: RpcResponse<R> = response.json().await.map_err(|e| ZabbixError::Decode {
            method: method.to_string(),
            reason: e.to_string(),
        })?;

        if let Some(err) = body.error {
            return Err(ZabbixError::Rpc {
                method: method.to_string(),
                code: err.code,
                message: err.message,
                data: err.data,
            });
        }

        body.result.ok_or_else(|| ZabbixError::Decode {
            method: method.to_string(),
            reason: "response has neither result nor error".into(),
        })
    }
}

#[async_trait]
impl Inventory for ZabbixClient {
    async fn authenticate(&self, user: &str, password: &str) -> Result<(), ZabbixError> {
        info!(endpoint = %self.endpoint, user, "Authenticating to Zabbix API");

        let token: String = self
            .send("user.login", json!({ "user": user, "password": password }), None)
            .await
            .map_err(|e| match e {
                ZabbixError::Rpc { message, data, .. } => {
                    ZabbixError::Auth(data.unwrap_or(message))
                }
                other => other,
            })?;

        *self.auth.write().await = Some(token);
        Ok(())
    }

    async fn find_hosts_by_alias(&self, alias: &str) -> Result<Vec<HostRecord>, ZabbixError> {
        let params = json!({
            "output": ["host", "description"],
            "selectInventory": ["alias"],
            "searchInventory": { "alias": alias },
        });
        let hosts: Vec<RawHost> = self.call("host.get", params).await?;
        Ok(hosts.into_iter().map(HostRecord::from).collect())
    }

    async fn update_host(&self, update: &HostUpdate) -> Result<(), ZabbixError> {
        let result: HostIds = self.call("host.update", update).await?;
        debug!(host_id = %update.host_id, updated = result.hostids.len(), "host.update applied");
        Ok(())
    }

    async fn delete_host(&self, host_id: &str) -> Result<(), ZabbixError> {
        let result: HostIds = self.call("host.delete", [host_id]).await?;
        debug!(host_id, deleted = result.hostids.len(), "host.delete applied");
        Ok(())
    }
}

fn normalize_endpoint(url: &str) -> Result<String, ZabbixError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ZabbixError::InvalidUrl {
            url: url.to_string(),
            reason: "empty".into(),
        });
    }

    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let endpoint = if with_scheme.ends_with(".php") {
        with_scheme
    } else {
        format!("{}/{API_PATH}", with_scheme.trim_end_matches('/'))
    };

    reqwest::Url::parse(&endpoint).map_err(|e| ZabbixError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    Ok(endpoint)
}
