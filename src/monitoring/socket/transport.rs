//! Wire side of the health channel
//!
//! The channel state machine only needs three things from the wire: a
//! connection that has been acknowledged, the health payloads arriving on it,
//! and the moment it closes or fails. [`SocketTransport`] is that seam.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};

use super::frame::{self, Frame, PONG};
use crate::config::SocketConfig;
use crate::monitoring::health::CredentialStore;
use crate::utils::error::{MonitorError, Result};

/// Upper bound on the TCP connect plus namespace handshake
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// An acknowledged connection delivering raw health payloads
#[async_trait]
pub trait SocketConnection: Send {
    /// Next payload in delivery order.
    ///
    /// `None` on an orderly close, `Some(Err(_))` when the transport fails.
    async fn next_payload(&mut self) -> Option<Result<Value>>;
}

/// Opens acknowledged connections to the health namespace
#[async_trait]
pub trait SocketTransport: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn SocketConnection>>;
}

fn ws_error(error: tokio_tungstenite::tungstenite::Error) -> MonitorError {
    MonitorError::websocket(error.to_string())
}

/// Socket.IO v4 client over `tokio-tungstenite`
pub struct TungsteniteTransport {
    url: String,
    namespace: String,
    event: String,
    credentials: Option<Arc<dyn CredentialStore>>,
}

impl fmt::Debug for TungsteniteTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TungsteniteTransport")
            .field("url", &self.url)
            .field("namespace", &self.namespace)
            .field("event", &self.event)
            .finish()
    }
}

impl TungsteniteTransport {
    pub fn new(config: &SocketConfig, credentials: Option<Arc<dyn CredentialStore>>) -> Self {
        Self {
            url: config.url.clone(),
            namespace: config.namespace.clone(),
            event: config.event.clone(),
            credentials,
        }
    }

    fn auth_payload(&self) -> Option<Value> {
        self.credentials
            .as_ref()
            .and_then(|c| c.bearer_token())
            .map(|token| json!({ "token": token }))
    }

    /// Drive the Engine.IO open and namespace connect until the server acks
    async fn handshake(&self, mut ws: WsStream) -> Result<TungsteniteConnection> {
        let mut pending = VecDeque::new();

        loop {
            let text = match ws.next().await {
                Some(Ok(Message::Text(text))) => text,
                Some(Ok(Message::Close(_))) | None => {
                    return Err(MonitorError::websocket("closed during handshake"));
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(ws_error(e)),
            };

            match frame::decode(&text) {
                Ok(Frame::Open(_)) => {
                    let connect =
                        frame::encode_connect(&self.namespace, self.auth_payload().as_ref());
                    ws.send(Message::Text(connect)).await.map_err(ws_error)?;
                }
                Ok(Frame::Ping) => {
                    ws.send(Message::Text(PONG.to_string()))
                        .await
                        .map_err(ws_error)?;
                }
                Ok(Frame::Connect { namespace }) if namespace == self.namespace => break,
                Ok(Frame::ConnectError { message, .. }) => {
                    return Err(MonitorError::websocket(format!(
                        "namespace {} refused: {}",
                        self.namespace, message
                    )));
                }
                Ok(Frame::Close) => {
                    return Err(MonitorError::websocket("closed during handshake"));
                }
                // A plain WebSocket backend acks by pushing its first payload
                Ok(Frame::Raw(value)) => {
                    pending.push_back(value);
                    break;
                }
                Ok(_) => {}
                Err(e) => warn!("Ignoring undecodable handshake frame: {}", e),
            }
        }

        Ok(TungsteniteConnection {
            ws,
            namespace: self.namespace.clone(),
            event: self.event.clone(),
            pending,
        })
    }
}

#[async_trait]
impl SocketTransport for TungsteniteTransport {
    async fn connect(&self) -> Result<Box<dyn SocketConnection>> {
        debug!("Connecting health channel to {}", self.url);

        let attempt = async {
            let (ws, _response) = connect_async(self.url.as_str()).await.map_err(ws_error)?;
            self.handshake(ws).await
        };

        let connection = tokio::time::timeout(HANDSHAKE_TIMEOUT, attempt)
            .await
            .map_err(|_| MonitorError::websocket("handshake timed out"))??;

        Ok(Box::new(connection))
    }
}

struct TungsteniteConnection {
    ws: WsStream,
    namespace: String,
    event: String,
    pending: VecDeque<Value>,
}

#[async_trait]
impl SocketConnection for TungsteniteConnection {
    async fn next_payload(&mut self) -> Option<Result<Value>> {
        if let Some(value) = self.pending.pop_front() {
            return Some(Ok(value));
        }

        loop {
            let text = match self.ws.next().await? {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => return None,
                Ok(_) => continue,
                Err(e) => return Some(Err(ws_error(e))),
            };

            match frame::decode(&text) {
                Ok(Frame::Ping) => {
                    if let Err(e) = self.ws.send(Message::Text(PONG.to_string())).await {
                        return Some(Err(ws_error(e)));
                    }
                }
                Ok(Frame::Event {
                    namespace,
                    name,
                    data,
                }) if namespace == self.namespace && name == self.event => return Some(Ok(data)),
                Ok(Frame::Raw(value)) => return Some(Ok(value)),
                Ok(Frame::Close) => return None,
                Ok(Frame::Disconnect { namespace }) if namespace == self.namespace => return None,
                Ok(Frame::ConnectError { message, .. }) => {
                    return Some(Err(MonitorError::websocket(message)));
                }
                Ok(_) => {}
                Err(e) => warn!("Ignoring undecodable health frame: {}", e),
            }
        }
    }
}
