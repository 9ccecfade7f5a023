//! Network layer for parkgate
//!
//! This crate pushes controller telemetry to an external collector over TCP,
//! one JSON document per line. It runs on its own Tokio task so the
//! controller's tick loop never waits on the network.
//!
//! # Example
//!
//! ```no_run
//! use parkgate_network::{TelemetryClient, TelemetryClientConfig};
//! use parkgate_core::config::TelemetryConfig;
//! use tokio::sync::mpsc;
//!
//! # async fn example() {
//! let (_tx, rx) = mpsc::channel(64);
//! let config = TelemetryClientConfig::from(&TelemetryConfig::default());
//! let _task = TelemetryClient::new(config).spawn(rx);
//! # }
//! ```

mod client;

pub use client::{TelemetryClient, TelemetryClientConfig, TelemetryClientError, TelemetryStats};
