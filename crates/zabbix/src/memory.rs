//! In-memory [`Inventory`] for tests.
//!
//! Mirrors the Zabbix behaviour the handler depends on: alias search matches
//! substrings, updates rename hosts in place, deletes remove them. Every call
//! is recorded so tests can assert exactly what would have hit the API.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::ZabbixError;
use crate::inventory::{HostRecord, HostUpdate, Inventory};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Authenticate(String),
    Find(String),
    Update(HostUpdate),
    Delete(String),
}

impl RecordedCall {
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Update(_) | Self::Delete(_))
    }
}

#[derive(Debug, Default)]
pub struct MemoryInventory {
    hosts: Mutex<Vec<HostRecord>>,
    calls: Mutex<Vec<RecordedCall>>,
    fail_auth: bool,
    fail_find: bool,
    fail_mutations: bool,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryInventory {
    pub fn new(hosts: Vec<HostRecord>) -> Self {
        Self {
            hosts: Mutex::new(hosts),
            ..Self::default()
        }
    }

    /// `authenticate` fails with [`ZabbixError::Auth`].
    pub fn fail_auth(mut self) -> Self {
        self.fail_auth = true;
        self
    }

    /// `find_hosts_by_alias` fails with an HTTP 503.
    pub fn fail_find(mut self) -> Self {
        self.fail_find = true;
        self
    }

    /// `update_host` and `delete_host` fail with an RPC error.
    pub fn fail_mutations(mut self) -> Self {
        self.fail_mutations = true;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn has_mutations(&self) -> bool {
        lock(&self.calls).iter().any(RecordedCall::is_mutation)
    }

    pub fn host(&self, host_id: &str) -> Option<HostRecord> {
        lock(&self.hosts).iter().find(|h| h.host_id == host_id).cloned()
    }

    fn record(&self, call: RecordedCall) {
        lock(&self.calls).push(call);
    }

    fn rpc_failure(method: &str) -> ZabbixError {
        ZabbixError::Rpc {
            method: method.to_string(),
            code: -32500,
            message: "Application error.".into(),
            data: Some("No permissions to referred object or it does not exist!".into()),
        }
    }
}

#[async_trait]
impl Inventory for MemoryInventory {
    async fn authenticate(&self, user: &str, _password: &str) -> Result<(), ZabbixError> {
        self.record(RecordedCall::Authenticate(user.to_string()));
        if self.fail_auth {
            return Err(ZabbixError::Auth(
                "Login name or password is incorrect.".into(),
            ));
        }
        Ok(())
    }

    async fn find_hosts_by_alias(&self, alias: &str) -> Result<Vec<HostRecord>, ZabbixError> {
        self.record(RecordedCall::Find(alias.to_string()));
        if self.fail_find {
            return Err(ZabbixError::Http {
                status: 503,
                body: "Service Unavailable".into(),
            });
        }
        Ok(lock(&self.hosts)
            .iter()
            .filter(|h| h.inventory_alias.as_deref().is_some_and(|a| a.contains(alias)))
            .cloned()
            .collect())
    }

    async fn update_host(&self, update: &HostUpdate) -> Result<(), ZabbixError> {
        self.record(RecordedCall::Update(update.clone()));
        if self.fail_mutations {
            return Err(Self::rpc_failure("host.update"));
        }
        let mut hosts = lock(&self.hosts);
        match hosts.iter_mut().find(|h| h.host_id == update.host_id) {
            Some(host) => {
                host.host_name = update.host_name.clone();
                host.description = Some(update.description.clone());
                Ok(())
            }
            None => Err(Self::rpc_failure("host.update")),
        }
    }

    async fn delete_host(&self, host_id: &str) -> Result<(), ZabbixError> {
        self.record(RecordedCall::Delete(host_id.to_string()));
        if self.fail_mutations {
            return Err(Self::rpc_failure("host.delete"));
        }
        let mut hosts = lock(&self.hosts);
        let before = hosts.len();
        hosts.retain(|h| h.host_id != host_id);
        if hosts.len() == before {
            return Err(Self::rpc_failure("host.delete"));
        }
        Ok(())
    }
}
