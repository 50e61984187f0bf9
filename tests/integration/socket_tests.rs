//! WebSocket transport integration tests

#[cfg(test)]
mod tests {
    use crate::common::{HealthBodies, SocketServer};
    use clinic_health_monitor::config::SocketConfig;
    use clinic_health_monitor::monitoring::TimerGauge;
    use clinic_health_monitor::{
        ConnectionState, MemoryCredentials, SocketTransport, TungsteniteTransport,
        WebSocketHealthChannel,
    };
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn config_for(url: &str) -> SocketConfig {
        SocketConfig {
            url: url.to_string(),
            reconnect_delay_ms: 50,
            max_reconnect_attempts: 2,
            ..SocketConfig::default()
        }
    }

    async fn wait_until<F>(within: Duration, mut condition: F)
    where
        F: FnMut() -> bool,
    {
        tokio::time::timeout(within, async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition not met in time");
    }

    #[tokio::test]
    async fn test_handshake_then_event_payload() {
        let push = HealthBodies::socket_push();
        let server = SocketServer::pushing(vec![push.clone()]).await;
        let transport = TungsteniteTransport::new(&config_for(server.url()), None);

        let mut connection = transport.connect().await.unwrap();
        let payload = tokio::time::timeout(Duration::from_secs(2), connection.next_payload())
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        assert_eq!(payload, push);
        assert_eq!(server.connections(), 1);
        assert_eq!(server.received()[0], "40/health,");
    }

    #[tokio::test]
    async fn test_connect_carries_token_and_answers_ping() {
        let server = SocketServer::pushing(vec![HealthBodies::socket_push()]).await;
        let credentials = Arc::new(MemoryCredentials::with_token("clinic-session"));
        let transport = TungsteniteTransport::new(&config_for(server.url()), Some(credentials));

        let mut connection = transport.connect().await.unwrap();
        let _ = tokio::time::timeout(Duration::from_secs(2), connection.next_payload()).await;

        wait_until(Duration::from_secs(2), || server.received().len() >= 2).await;
        let received = server.received();
        let connect = received[0].strip_prefix("40/health,").unwrap();
        let auth: serde_json::Value = serde_json::from_str(connect).unwrap();
        assert_eq!(auth, json!({ "token": "clinic-session" }));
        assert_eq!(received[1], "3");
    }

    #[tokio::test]
    async fn test_refused_namespace_fails_connect() {
        let server = SocketServer::refusing("unauthorized").await;
        let transport = TungsteniteTransport::new(&config_for(server.url()), None);

        let err = transport.connect().await.err().unwrap();
        let message = err.to_string();
        assert!(message.contains("refused"), "{}", message);
        assert!(message.contains("unauthorized"), "{}", message);
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_connect() {
        let transport = TungsteniteTransport::new(&config_for("ws://127.0.0.1:9/socket.io/"), None);
        assert!(transport.connect().await.is_err());
    }

    #[tokio::test]
    async fn test_channel_delivers_pushes_to_subscribers() {
        let server = SocketServer::pushing(vec![HealthBodies::socket_push()]).await;
        let config = config_for(server.url());
        let transport = Arc::new(TungsteniteTransport::new(&config, None));
        let channel = WebSocketHealthChannel::new(transport, &config, TimerGauge::new());

        let mut states = channel.watch_state();
        channel.connect().unwrap();
        tokio::time::timeout(
            Duration::from_secs(2),
            states.wait_for(|state| *state == ConnectionState::Connected),
        )
        .await
        .unwrap()
        .unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscription = channel
            .subscribe(move |payload| {
                let _ = tx.send(payload.clone());
            })
            .unwrap();

        let payload = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payload.database.unwrap().is_healthy, Some(true));
        assert!(subscription.is_live());

        channel.disconnect().await;
        assert_eq!(channel.connection_state(), ConnectionState::Disconnected);
        assert!(!subscription.is_live());
    }

    #[tokio::test]
    async fn test_channel_gives_up_after_refusals() {
        let server = SocketServer::refusing("unauthorized").await;
        let config = config_for(server.url());
        let transport = Arc::new(TungsteniteTransport::new(&config, None));
        let channel = WebSocketHealthChannel::new(transport, &config, TimerGauge::new());

        let mut states = channel.watch_state();
        channel.connect().unwrap();
        tokio::time::timeout(
            Duration::from_secs(5),
            states.wait_for(|state| *state == ConnectionState::Error),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(server.connections(), 2);
        assert!(channel.last_error().unwrap().contains("unauthorized"));
        assert!(channel.subscribe(|_| {}).is_none());
    }
}
