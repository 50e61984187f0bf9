//! Backend health checking
//!
//! HTTP probing, snapshot aggregation and the adaptive poller, hosted by
//! [`HealthMonitor`].

mod aggregator;
mod cache;
mod credentials;
mod mapping;
mod monitor;
mod payload;
mod poller;
mod probe;
mod tasks;
mod throttle;
mod types;


pub use aggregator::{HealthAggregator, HealthUpdate, SERVICE_NOT_FOUND};
pub use cache::StatusCache;
pub use credentials::{CredentialStore, EnvCredentials, MemoryCredentials};
pub use mapping::{OverallStatus, map_raw_status, map_signal, rollup, status_label};
pub use monitor::{CycleOutcome, CycleTrigger, HealthMonitor, HealthMonitorBuilder};
pub use payload::{
    CacheSignal, CommunicationSignal, DatabaseSignal, HttpHealthPayload, HttpServices,
    LatencyInfo, PayloadError, QueueSignal, ServiceEntry, SocketHealthPayload, SocketInfo,
    SystemMetrics, parse_http_payload, parse_socket_payload,
};
pub use poller::{AdaptivePoller, PollIntervalPolicy, PollTarget};
pub use probe::{HealthProbe, HealthSource, ProbeFailure, ProbeReport};
pub use throttle::RequestThrottle;
pub use types::{BackendStatusSnapshot, ServiceHealth, ServiceKind, ServiceStatus, StatusSource};
