//! Uptime Kuma REST API Client
//!
//! A Rust client library for the Uptime Kuma REST gateway.
//! Provides typed models and methods for managing monitors and their tags.
//!
//! # Example
//!
//! ```no_run
//! use uptime_kuma_client::{
//!     MonitorRequest, MonitorSettings, UptimeKumaClient, UptimeKumaClientTrait,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = UptimeKumaClient::new("http://uptime-kuma-api:8000".to_string(), None)?;
//!
//! // Create an HTTP monitor and tag it
//! let settings = MonitorSettings::default();
//! let request = MonitorRequest::http("default/web/home", "https://example.com", &settings);
//! let id = client.create_monitor(&request).await?;
//! let tag = client.create_tag("team:web", "#007acc").await?;
//! client.add_monitor_tag(id, tag.id).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
#[path = "trait.rs"]
pub mod kuma_trait;
pub mod models;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::UptimeKumaClient;
pub use error::UptimeKumaError;
pub use kuma_trait::UptimeKumaClientTrait;
pub use models::*;
#[cfg(feature = "test-util")]
pub use mock::{MockUptimeKumaClient, Operation};
