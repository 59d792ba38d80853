//! Zabbix side of the deregistration flow.
//!
//! This crate provides:
//! - `Inventory` trait over the handful of Zabbix API calls the handler needs
//! - `ZabbixClient`, the JSON-RPC implementation of it
//! - `InventoryResolver`, which classifies the hosts found for an instance
//! - `HostTransitioner`, which disables-and-marks or deletes a resolved host

pub mod client;
pub mod error;
pub mod inventory;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod resolver;
pub mod transition;

pub use client::ZabbixClient;
pub use error::ZabbixError;
pub use inventory::{HostRecord, HostUpdate, Inventory, HOST_STATUS_NOT_MONITORED};
pub use resolver::{InventoryResolver, TransitionDecision};
pub use transition::{
    is_pending_purge, HostTransitioner, TransitionAnnotation, TransitionOutcome, TransitionPolicy,
    PENDING_PURGE_PREFIX,
};
