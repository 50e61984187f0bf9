//! Monitor integration tests
//!
//! The full monitor against a mocked health endpoint, and against a local
//! Socket.IO server for the push path.

#[cfg(test)]
mod tests {
    use crate::common::assertions::SnapshotAssertions;
    use crate::common::{ConfigFactory, HealthBodies, SocketServer, wait_for};
    use clinic_health_monitor::{
        ConnectionState, CycleOutcome, HealthMonitor, OverallStatus, ServiceKind, ServiceStatus,
        StatusSource,
    };
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const WAIT: Duration = Duration::from_secs(5);

    async fn health_endpoint(status: u16, body: serde_json::Value, hits: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .and(query_param("detailed", "true"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .expect(hits)
            .mount(&server)
            .await;
        server
    }

    // ==================== HTTP only ====================

    #[tokio::test]
    async fn test_refresh_fills_every_service() {
        let server = health_endpoint(200, HealthBodies::all_up(), 1).await;
        let monitor = HealthMonitor::start(ConfigFactory::http_only(&server.uri())).unwrap();
        assert_eq!(monitor.indicator().label, "Checking Systems");

        let outcome = monitor.refresh().await;
        assert!(outcome.reached_network());

        let snapshot = monitor.snapshot();
        snapshot.assert_fully_observed();
        for kind in ServiceKind::ALL {
            snapshot.assert_service(kind, ServiceStatus::Active);
        }
        assert_eq!(snapshot.source(), StatusSource::Polling);
        assert!(snapshot.last_global_check().is_some());
        assert!(!monitor.is_checking());

        let indicator = monitor.indicator();
        assert_eq!(indicator.overall, OverallStatus::Active);
        assert_eq!(indicator.label, "All Systems Live");
        assert_eq!(monitor.connection_state(), None);

        monitor.shutdown().await;
    }

    #[tokio::test]
    async fn test_second_refresh_is_served_from_cache() {
        let server = health_endpoint(200, HealthBodies::all_up(), 1).await;
        let monitor = HealthMonitor::start(ConfigFactory::http_only(&server.uri())).unwrap();

        let first = monitor.refresh().await;
        assert!(matches!(first, CycleOutcome::Completed(_)));

        // Immediately again: inside the cooldown
        assert_eq!(monitor.refresh().await, CycleOutcome::Throttled);

        tokio::time::sleep(Duration::from_millis(80)).await;
        let cached = monitor.refresh().await;
        assert!(matches!(cached, CycleOutcome::Cached(_)));
        assert!(!cached.reached_network());

        assert_eq!(monitor.probe_calls(), 1);
        monitor.shutdown().await;
    }

    #[tokio::test]
    async fn test_degraded_realtime_names_parts() {
        let server = health_endpoint(200, HealthBodies::degraded_realtime(), 1).await;
        let monitor = HealthMonitor::start(ConfigFactory::http_only(&server.uri())).unwrap();

        monitor.refresh().await;
        let snapshot = monitor.snapshot();

        snapshot.assert_service(ServiceKind::Realtime, ServiceStatus::Warning);
        assert_eq!(
            snapshot.service(ServiceKind::Realtime).error_detail(),
            Some("Degraded: queue, cache")
        );
        snapshot.assert_service(ServiceKind::Api, ServiceStatus::Warning);
        snapshot.assert_service(ServiceKind::Database, ServiceStatus::Active);
        snapshot.assert_service(ServiceKind::Auth, ServiceStatus::Active);

        let view = monitor.detailed();
        assert_eq!(view.indicator.overall, OverallStatus::Warning);
        assert_eq!(view.indicator.label, "3/5 Systems Live");
        assert_eq!(view.rows.len(), 5);

        monitor.shutdown().await;
    }

    #[tokio::test]
    async fn test_failed_probe_is_not_cached() {
        let server = health_endpoint(500, serde_json::json!({ "error": "db pool exhausted" }), 2)
            .await;
        let monitor = HealthMonitor::start(ConfigFactory::http_only(&server.uri())).unwrap();

        assert!(monitor.refresh().await.reached_network());
        let snapshot = monitor.snapshot();
        snapshot.assert_service(ServiceKind::Api, ServiceStatus::Error);
        assert_eq!(
            snapshot.service(ServiceKind::Api).error_detail(),
            Some("HTTP 500: db pool exhausted")
        );
        // Without a payload the other services keep their previous state
        snapshot.assert_service(ServiceKind::Database, ServiceStatus::Loading);
        assert_eq!(snapshot.overall(), OverallStatus::Error);
        assert_eq!(monitor.healthy_streak(), 0);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(monitor.refresh().await.reached_network());
        assert_eq!(monitor.probe_calls(), 2);

        monitor.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_everything() {
        let server = health_endpoint(200, HealthBodies::all_up(), 0).await;
        let monitor = HealthMonitor::start(ConfigFactory::http_only(&server.uri())).unwrap();

        monitor.shutdown().await;

        assert!(monitor.is_closed());
        assert_eq!(monitor.armed_timers(), 0);
        assert_eq!(monitor.refresh().await, CycleOutcome::Closed);
        assert_eq!(monitor.probe_calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_at_start() {
        let mut config = ConfigFactory::http_only("ftp://clinic.example.com");
        config.polling.cooldown_ms = 0;

        let err = HealthMonitor::start(config).err().unwrap();
        assert!(err.is_config());
    }

    // ==================== Hybrid ====================

    #[tokio::test]
    async fn test_socket_push_takes_over_snapshot() {
        let http = health_endpoint(200, HealthBodies::all_up(), 0).await;
        let socket = SocketServer::pushing(vec![HealthBodies::socket_push()]).await;
        let monitor =
            HealthMonitor::start(ConfigFactory::hybrid(&http.uri(), socket.url())).unwrap();

        let mut updates = monitor.subscribe();
        let snapshot = wait_for(&mut updates, WAIT, |s| {
            s.source() == StatusSource::Socket
                && s.service(ServiceKind::Realtime).status() != ServiceStatus::Loading
        })
        .await;

        assert_eq!(monitor.connection_state(), Some(ConnectionState::Connected));
        snapshot.assert_fully_observed();
        for kind in ServiceKind::ALL {
            snapshot.assert_service(kind, ServiceStatus::Active);
        }
        assert_eq!(
            snapshot.service(ServiceKind::Database).response_time_ms(),
            Some(8)
        );
        assert_eq!(monitor.indicator().label, "All Systems Live");
        // Pushes alone never reach the HTTP endpoint
        assert_eq!(monitor.probe_calls(), 0);

        monitor.shutdown().await;
        assert_eq!(monitor.armed_timers(), 0);
        assert_eq!(
            monitor.connection_state(),
            Some(ConnectionState::Disconnected)
        );
    }

    #[tokio::test]
    async fn test_refused_channel_reports_websocket_error() {
        let http = health_endpoint(200, HealthBodies::all_up(), 0).await;
        let socket = SocketServer::refusing("unauthorized").await;
        let monitor =
            HealthMonitor::start(ConfigFactory::hybrid(&http.uri(), socket.url())).unwrap();

        let mut updates = monitor.subscribe();
        let snapshot = wait_for(&mut updates, WAIT, |s| {
            s.service(ServiceKind::Websocket).status() == ServiceStatus::Error
        })
        .await;

        assert_eq!(monitor.connection_state(), Some(ConnectionState::Error));
        let detail = snapshot
            .service(ServiceKind::Websocket)
            .error_detail()
            .unwrap();
        assert!(detail.contains("unauthorized"), "{}", detail);

        monitor.shutdown().await;
    }
}
