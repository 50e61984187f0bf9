//! Socket.IO v4 / Engine.IO v4 text frame codec
//!
//! Only the subset a health subscriber needs: open, ping/pong, namespace
//! connect and its errors, and events. Raw JSON objects are passed through
//! for plain WebSocket backends.

use serde_json::Value;
use thiserror::Error;

/// Engine.IO pong, the reply to a server ping
pub const PONG: &str = "3";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
    #[error("empty frame")]
    Empty,

    #[error("unknown packet type '{0}'")]
    UnknownPacket(char),

    #[error("invalid JSON in frame: {0}")]
    Json(String),

    #[error("event frame is not a [name, data] array")]
    EventShape,
}

/// One decoded text frame
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Engine.IO handshake with session parameters
    Open(Value),
    Close,
    Ping,
    Pong,
    /// Namespace connect (the server's reply is the ack)
    Connect { namespace: String },
    Disconnect { namespace: String },
    ConnectError { namespace: String, message: String },
    Event {
        namespace: String,
        name: String,
        data: Value,
    },
    /// Raw JSON object sent without Socket.IO framing
    Raw(Value),
    /// Packets a health subscriber has no use for (acks, binary, upgrade, noop)
    Ignored,
}

fn parse_json(text: &str) -> Result<Value, FrameError> {
    serde_json::from_str(text).map_err(|e| FrameError::Json(e.to_string()))
}

/// Decode one text frame
pub fn decode(text: &str) -> Result<Frame, FrameError> {
    if text.starts_with('{') {
        return parse_json(text).map(Frame::Raw);
    }

    let kind = text.chars().next().ok_or(FrameError::Empty)?;
    let rest = &text[kind.len_utf8()..];

    match kind {
        '0' if rest.is_empty() => Ok(Frame::Open(Value::Null)),
        '0' => parse_json(rest).map(Frame::Open),
        '1' => Ok(Frame::Close),
        '2' => Ok(Frame::Ping),
        '3' => Ok(Frame::Pong),
        '4' => decode_socket_packet(rest),
        '5' | '6' => Ok(Frame::Ignored),
        other => Err(FrameError::UnknownPacket(other)),
    }
}

fn decode_socket_packet(text: &str) -> Result<Frame, FrameError> {
    let kind = text.chars().next().ok_or(FrameError::Empty)?;
    let rest = &text[kind.len_utf8()..];

    let (namespace, rest) = if rest.starts_with('/') {
        match rest.find(',') {
            Some(idx) => (&rest[..idx], &rest[idx + 1..]),
            None => (rest, ""),
        }
    } else {
        ("/", rest)
    };
    let namespace = namespace.to_string();
    // Optional ack id
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());

    match kind {
        '0' => Ok(Frame::Connect { namespace }),
        '1' => Ok(Frame::Disconnect { namespace }),
        '2' => {
            let value = parse_json(rest)?;
            let items = value.as_array().ok_or(FrameError::EventShape)?;
            let name = items
                .first()
                .and_then(Value::as_str)
                .ok_or(FrameError::EventShape)?
                .to_string();
            let data = items.get(1).cloned().unwrap_or(Value::Null);
            Ok(Frame::Event {
                namespace,
                name,
                data,
            })
        }
        '4' => {
            let message = match parse_json(rest) {
                Ok(Value::Object(map)) => map
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("connection refused")
                    .to_string(),
                Ok(Value::String(s)) => s,
                _ => rest.to_string(),
            };
            Ok(Frame::ConnectError { namespace, message })
        }
        '3' | '5' | '6' => Ok(Frame::Ignored),
        other => Err(FrameError::UnknownPacket(other)),
    }
}

/// Namespace connect request, with optional auth payload
pub fn encode_connect(namespace: &str, auth: Option<&Value>) -> String {
    let auth = auth.map(Value::to_string).unwrap_or_default();
    if namespace == "/" {
        format!("40{}", auth)
    } else {
        format!("40{},{}", namespace, auth)
    }
}
