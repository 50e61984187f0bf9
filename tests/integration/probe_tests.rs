//! HTTP probe integration tests
//!
//! Every outcome of a probe, success or failure, is a report rather than an
//! error.

#[cfg(test)]
mod tests {
    use crate::common::HealthBodies;
    use clinic_health_monitor::config::HttpConfig;
    use clinic_health_monitor::{
        HealthProbe, HealthSource, MemoryCredentials, ProbeFailure, ServiceStatus,
    };
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(2);

    fn probe_for(base: &str) -> HealthProbe {
        let config = HttpConfig {
            api_base: base.to_string(),
            ..HttpConfig::default()
        };
        HealthProbe::new(&config, None).unwrap()
    }

    // ==================== Successful responses ====================

    #[tokio::test]
    async fn test_detailed_payload_is_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .and(query_param("detailed", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(HealthBodies::all_up()))
            .expect(1)
            .mount(&server)
            .await;

        let report = probe_for(&server.uri())
            .probe("/health?detailed=true", TIMEOUT)
            .await;

        assert!(report.is_success());
        assert_eq!(report.failure, None);
        assert_eq!(report.api.status(), ServiceStatus::Active);
        assert_eq!(report.api.error_detail(), None);
        assert!(report.api.response_time_ms().is_some());

        let payload = report.payload.unwrap();
        assert_eq!(payload.version.as_deref(), Some("2.3.1"));
        let services = payload.services.unwrap();
        assert_eq!(services.database.unwrap().response_time, Some(12.4));
    }

    #[tokio::test]
    async fn test_degraded_backend_warns_on_api() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(HealthBodies::degraded_realtime()),
            )
            .mount(&server)
            .await;

        let report = probe_for(&server.uri()).probe("/health", TIMEOUT).await;

        assert!(report.is_success());
        assert_eq!(report.api.status(), ServiceStatus::Warning);
        assert_eq!(report.api.error_detail(), Some("Backend reports degraded"));
    }

    #[tokio::test]
    async fn test_payload_without_status_counts_as_answering() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "version": "1.0.0" })))
            .mount(&server)
            .await;

        let report = probe_for(&server.uri()).probe("/health", TIMEOUT).await;

        assert!(report.is_success());
        assert_eq!(report.api.status(), ServiceStatus::Active);
    }

    #[tokio::test]
    async fn test_base_path_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(HealthBodies::all_up()))
            .expect(1)
            .mount(&server)
            .await;

        let base = format!("{}/api/v1", server.uri());
        let report = probe_for(&base).probe("/health", TIMEOUT).await;

        assert!(report.is_success());
    }

    #[tokio::test]
    async fn test_bearer_token_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .and(header("authorization", "Bearer clinic-session"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(HealthBodies::all_up()))
            .expect(1)
            .mount(&server)
            .await;

        let config = HttpConfig {
            api_base: server.uri(),
            ..HttpConfig::default()
        };
        let credentials = Arc::new(MemoryCredentials::with_token("clinic-session"));
        let probe = HealthProbe::new(&config, Some(credentials)).unwrap();

        let report = probe.probe("/health", TIMEOUT).await;
        assert!(report.is_success());
    }

    // ==================== Failures ====================

    #[tokio::test]
    async fn test_non_2xx_carries_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(
                ResponseTemplate::new(503)
                    .set_body_json(json!({ "message": "maintenance window" })),
            )
            .mount(&server)
            .await;

        let report = probe_for(&server.uri()).probe("/health", TIMEOUT).await;

        assert!(!report.is_success());
        assert_eq!(report.api.status(), ServiceStatus::Error);
        assert_eq!(report.api.error_detail(), Some("HTTP 503: maintenance window"));
        assert_eq!(
            report.failure,
            Some(ProbeFailure::Http {
                status: 503,
                message: "maintenance window".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_non_2xx_without_body_uses_reason() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let report = probe_for(&server.uri()).probe("/health", TIMEOUT).await;

        assert_eq!(report.api.error_detail(), Some("HTTP 502: Bad Gateway"));
    }

    #[tokio::test]
    async fn test_slow_backend_times_out_as_warning() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(HealthBodies::all_up())
                    .set_delay(Duration::from_millis(800)),
            )
            .mount(&server)
            .await;

        let report = probe_for(&server.uri())
            .probe("/health", Duration::from_millis(100))
            .await;

        assert_eq!(report.failure, Some(ProbeFailure::Timeout));
        assert_eq!(report.api.status(), ServiceStatus::Warning);
        assert_eq!(
            report.api.error_detail(),
            Some("Request timeout — backend may be slow or overloaded")
        );
        assert!(report.payload.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_connection_failure() {
        // Nothing listens on the discard port
        let report = probe_for("http://127.0.0.1:9").probe("/health", TIMEOUT).await;

        assert!(matches!(report.failure, Some(ProbeFailure::Connection(_))));
        assert_eq!(report.api.status(), ServiceStatus::Error);
        assert!(
            report
                .api
                .error_detail()
                .unwrap()
                .starts_with("Connection failed")
        );
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let report = probe_for(&server.uri()).probe("/health", TIMEOUT).await;

        assert!(matches!(report.failure, Some(ProbeFailure::Malformed(_))));
        assert_eq!(report.api.status(), ServiceStatus::Error);
    }
}
