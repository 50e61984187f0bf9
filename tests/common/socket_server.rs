//! Local Socket.IO server for transport tests
//!
//! Speaks the Engine.IO open, the namespace connect and event frames over a
//! plain `tokio-tungstenite` listener. Every accepted connection runs the
//! same script.

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, Clone)]
enum Script {
    /// Ack the namespace, ping once, then push each payload
    Accept(Vec<Value>),
    /// Refuse the namespace connect
    Refuse(String),
}

pub struct SocketServer {
    url: String,
    connections: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl SocketServer {
    /// Accept connections and push `payloads` as `health` events
    pub async fn pushing(payloads: Vec<Value>) -> Self {
        Self::start(Script::Accept(payloads)).await
    }

    /// Refuse every namespace connect with `message`
    pub async fn refusing(message: &str) -> Self {
        Self::start(Script::Refuse(message.to_string())).await
    }

    async fn start(script: Script) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let received = Arc::new(Mutex::new(Vec::new()));

        let handle = {
            let connections = connections.clone();
            let received = received.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    connections.fetch_add(1, Ordering::SeqCst);
                    let script = script.clone();
                    let received = received.clone();
                    tokio::spawn(async move {
                        let Ok(ws) = accept_async(stream).await else {
                            return;
                        };
                        serve(ws, script, received).await;
                    });
                }
            })
        };

        Self {
            url: format!("ws://{}/socket.io/?EIO=4&transport=websocket", addr),
            connections,
            received,
            handle,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Every text frame the clients sent, in arrival order
    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }
}

impl Drop for SocketServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve<S>(
    mut ws: tokio_tungstenite::WebSocketStream<S>,
    script: Script,
    received: Arc<Mutex<Vec<String>>>,
) where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let open = json!({
        "sid": "engine",
        "upgrades": [],
        "pingInterval": 25000,
        "pingTimeout": 20000
    });
    if ws.send(Message::Text(format!("0{}", open))).await.is_err() {
        return;
    }

    // Namespace connect from the client
    match ws.next().await {
        Some(Ok(Message::Text(text))) => received.lock().push(text),
        _ => return,
    }

    match script {
        Script::Refuse(message) => {
            let refusal = format!("44/health,{}", json!({ "message": message }));
            let _ = ws.send(Message::Text(refusal)).await;
        }
        Script::Accept(payloads) => {
            let ack = format!("40/health,{}", json!({ "sid": "namespace" }));
            if ws.send(Message::Text(ack)).await.is_err() {
                return;
            }
            if ws.send(Message::Text("2".to_string())).await.is_err() {
                return;
            }
            for payload in payloads {
                let event = format!("42/health,{}", json!(["health", payload]));
                if ws.send(Message::Text(event)).await.is_err() {
                    return;
                }
            }
        }
    }

    // Hold the connection until the client leaves
    while let Some(Ok(message)) = ws.next().await {
        match message {
            Message::Text(text) => received.lock().push(text),
            Message::Close(_) => break,
            _ => {}
        }
    }
}
