//! Autoscaling termination handler.
//!
//! Takes an SNS delivery of an autoscaling termination, finds the Zabbix host
//! registered for the terminated instance, and takes it out of monitoring.

pub mod error;
pub mod handler;

pub use error::HandlerError;
pub use handler::{Handler, HandlerOutcome, HOST_ALREADY_UPDATED, HOST_NOT_FOUND};
