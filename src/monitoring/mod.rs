//! Health monitoring
//!
//! `health` holds the probe, aggregation and scheduling side; `socket` holds
//! the push channel. Both share the [`TimerGauge`] in `timers`.

pub mod health;
pub mod socket;
pub mod timers;

pub use health::{BackendStatusSnapshot, HealthMonitor, ServiceHealth, ServiceKind, ServiceStatus};
pub use socket::{ConnectionState, WebSocketHealthChannel};
pub use timers::TimerGauge;
