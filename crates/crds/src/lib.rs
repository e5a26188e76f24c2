//! Uptime Operator CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for the Uptime Operator controller.

pub mod uptime_monitor;

pub use uptime_monitor::*;
