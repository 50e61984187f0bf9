//! # Clinic Health Monitor
//!
//! Client-side health monitoring for the clinic backend. A Socket.IO push
//! channel and an adaptive HTTP poller feed one normalized snapshot of five
//! services (API, database, WebSocket, auth, realtime), which the
//! presentation views render as an indicator, a detailed panel or a
//! floating widget.
//!
//! ## Features
//!
//! - **Hybrid sources**: WebSocket pushes are authoritative while connected;
//!   HTTP polling takes over whenever the channel is down
//! - **Throttle and cache**: a cooldown gate and a time-boxed snapshot cache
//!   in front of every probe
//! - **Adaptive polling**: the interval grows with the healthy streak
//! - **One mapping, one rollup**: every raw status and every overall status
//!   goes through a single function
//! - **Clean teardown**: shutdown leaves no timer armed
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clinic_health_monitor::{HealthMonitor, MonitorConfig, init_logging};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MonitorConfig::from_env()?;
//!     init_logging(&config.logging);
//!
//!     let monitor = HealthMonitor::start(config)?;
//!     let mut updates = monitor.subscribe();
//!
//!     while updates.changed().await.is_ok() {
//!         let indicator = monitor.indicator();
//!         println!("{}: {}", indicator.overall, indicator.label);
//!     }
//!
//!     monitor.shutdown().await;
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod monitoring;
pub mod presentation;
pub mod utils;

// Re-export main types
pub use config::{MonitorConfig, Validate};
pub use utils::error::{MonitorError, Result};
pub use utils::logging::{LogLevel, init_logging};

pub use monitoring::health::{
    BackendStatusSnapshot, CredentialStore, CycleOutcome, EnvCredentials, HealthAggregator,
    HealthMonitor, HealthMonitorBuilder, HealthProbe, HealthSource, HealthUpdate,
    MemoryCredentials, OverallStatus, ProbeFailure, ProbeReport, ServiceHealth, ServiceKind,
    ServiceStatus, StatusSource,
};
pub use monitoring::socket::{
    ConnectionState, SocketConnection, SocketTransport, Subscription, TungsteniteTransport,
    WebSocketHealthChannel,
};
pub use presentation::{DetailedView, IndicatorView, StatusPresentation, StatusWidget};

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
