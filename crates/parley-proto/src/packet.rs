//! Engine.IO v4 / Socket.IO v4 text packets.
//!
//! Layout on the wire (one WebSocket text message per packet):
//!
//! ```text
//! <engine type digit>[<socket type digit>[/<namespace>,][<ack id>]<json>]
//! ```
//!
//! Only the default namespace and text packets are supported. Binary
//! attachments and acknowledgements are rejected with
//! [`ProtocolError::UnsupportedSocketType`]; the transport skips them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ProtocolError, Result};

/// Engine.IO open handshake sent by the server on connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    /// Engine.IO session id.
    pub sid: String,
    /// Transports the server offers to upgrade to.
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Server ping interval in milliseconds.
    pub ping_interval: u64,
    /// Time the server waits for a pong in milliseconds.
    pub ping_timeout: u64,
    /// Largest payload the server accepts, in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_payload: Option<u64>,
}

/// Engine.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    /// `0` – session opened.
    Open(Handshake),
    /// `1` – transport closing.
    Close,
    /// `2` – heartbeat from the server.
    Ping,
    /// `3` – heartbeat reply.
    Pong,
    /// `4` – Socket.IO packet.
    Message(SocketPacket),
    /// `6` – no-op.
    Noop,
}

/// Socket.IO packet (always on the default namespace).
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    /// `0` – namespace connect. The server's acknowledgement carries `sid`.
    Connect {
        /// Socket id assigned by the server.
        sid: Option<String>,
    },
    /// `1` – namespace disconnect.
    Disconnect,
    /// `2` – named event with at most one payload argument.
    Event {
        /// Event name.
        name: String,
        /// First argument, if any.
        payload: Option<Value>,
    },
    /// `4` – namespace connect refused.
    ConnectError {
        /// Server-provided reason.
        message: String,
    },
}

impl EnginePacket {
    /// Encode to the text sent over the WebSocket.
    pub fn encode(&self) -> Result<String> {
        let text = match self {
            Self::Open(handshake) => format!("0{}", serde_json::to_string(handshake)?),
            Self::Close => "1".to_string(),
            Self::Ping => "2".to_string(),
            Self::Pong => "3".to_string(),
            Self::Message(packet) => format!("4{}", packet.encode()?),
            Self::Noop => "6".to_string(),
        };
        Ok(text)
    }

    /// Decode one WebSocket text message.
    pub fn decode(text: &str) -> Result<Self> {
        let mut chars = text.chars();
        let kind = chars.next().ok_or(ProtocolError::EmptyPacket)?;
        let rest = chars.as_str();

        match kind {
            '0' => Ok(Self::Open(serde_json::from_str(rest)?)),
            '1' => Ok(Self::Close),
            // Probe pings carry a trailing "probe"; we never upgrade so the
            // data is irrelevant.
            '2' => Ok(Self::Ping),
            '3' => Ok(Self::Pong),
            '4' => Ok(Self::Message(SocketPacket::decode(rest)?)),
            '6' => Ok(Self::Noop),
            other => Err(ProtocolError::UnknownEngineType(other)),
        }
    }
}

impl SocketPacket {
    fn encode(&self) -> Result<String> {
        let text = match self {
            Self::Connect { sid: None } => "0".to_string(),
            Self::Connect { sid: Some(sid) } => {
                let mut object = serde_json::Map::new();
                object.insert("sid".into(), Value::String(sid.clone()));
                format!("0{}", Value::Object(object))
            },
            Self::Disconnect => "1".to_string(),
            Self::Event { name, payload } => {
                let mut args = vec![Value::String(name.clone())];
                args.extend(payload.iter().cloned());
                format!("2{}", serde_json::to_string(&args)?)
            },
            Self::ConnectError { message } => {
                let mut object = serde_json::Map::new();
                object.insert("message".into(), Value::String(message.clone()));
                format!("4{}", Value::Object(object))
            },
        };
        Ok(text)
    }

    fn decode(text: &str) -> Result<Self> {
        let mut chars = text.chars();
        let kind = chars.next().ok_or(ProtocolError::EmptyPacket)?;
        let body = skip_namespace(chars.as_str());

        match kind {
            '0' => {
                if body.is_empty() {
                    return Ok(Self::Connect { sid: None });
                }
                let value: Value = serde_json::from_str(body)?;
                let sid = value.get("sid").and_then(Value::as_str).map(str::to_string);
                Ok(Self::Connect { sid })
            },
            '1' => Ok(Self::Disconnect),
            '2' => decode_event(body),
            '4' => {
                let value: Value = serde_json::from_str(body)?;
                let message = match value {
                    Value::String(message) => message,
                    other => other
                        .get("message")
                        .and_then(Value::as_str)
                        .map_or_else(|| other.to_string(), str::to_string),
                };
                Ok(Self::ConnectError { message })
            },
            other => Err(ProtocolError::UnsupportedSocketType(other)),
        }
    }
}

/// Strip an optional `/namespace,` prefix.
fn skip_namespace(body: &str) -> &str {
    if body.starts_with('/') {
        body.split_once(',').map_or("", |(_, rest)| rest)
    } else {
        body
    }
}

fn decode_event(body: &str) -> Result<SocketPacket> {
    // Optional numeric ack id before the JSON array.
    let body = body.trim_start_matches(|c: char| c.is_ascii_digit());
    let args: Vec<Value> = serde_json::from_str(body)?;
    let mut args = args.into_iter();

    let name = match args.next() {
        Some(Value::String(name)) => name,
        Some(other) => {
            return Err(ProtocolError::Malformed(format!("event name must be a string: {other}")));
        },
        None => return Err(ProtocolError::Malformed("event without a name".to_string())),
    };

    Ok(SocketPacket::Event { name, payload: args.next() })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_server_handshake() {
        let text = concat!(
            r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"#,
            r#""pingTimeout":20000,"maxPayload":1000000}"#
        );
        let packet = EnginePacket::decode(text).unwrap();

        assert_eq!(
            packet,
            EnginePacket::Open(Handshake {
                sid: "abc".into(),
                upgrades: vec![],
                ping_interval: 25000,
                ping_timeout: 20000,
                max_payload: Some(1_000_000),
            })
        );
    }

    #[test]
    fn encodes_event_as_json_array() {
        let packet = EnginePacket::Message(SocketPacket::Event {
            name: "joinRoom".into(),
            payload: Some(json!("general")),
        });
        assert_eq!(packet.encode().unwrap(), r#"42["joinRoom","general"]"#);
    }

    #[test]
    fn event_without_payload_is_name_only() {
        let packet =
            EnginePacket::Message(SocketPacket::Event { name: "logout".into(), payload: None });
        assert_eq!(packet.encode().unwrap(), r#"42["logout"]"#);
    }

    #[test]
    fn decodes_connect_ack_with_sid() {
        let packet = EnginePacket::decode(r#"40{"sid":"xyz"}"#).unwrap();
        let connect = SocketPacket::Connect { sid: Some("xyz".into()) };
        assert_eq!(packet, EnginePacket::Message(connect));

        let packet = EnginePacket::decode("40").unwrap();
        assert_eq!(packet, EnginePacket::Message(SocketPacket::Connect { sid: None }));
    }

    #[test]
    fn decodes_event_with_namespace_and_ack_id() {
        let packet = EnginePacket::decode(r#"42/chat,17["chatMessage","bob: hi"]"#).unwrap();
        assert_eq!(
            packet,
            EnginePacket::Message(SocketPacket::Event {
                name: "chatMessage".into(),
                payload: Some(json!("bob: hi")),
            })
        );
    }

    #[test]
    fn ping_with_probe_is_ping() {
        assert_eq!(EnginePacket::decode("2probe").unwrap(), EnginePacket::Ping);
    }

    #[test]
    fn connect_error_reads_message() {
        let packet = EnginePacket::decode(r#"44{"message":"Not authorized"}"#).unwrap();
        assert_eq!(
            packet,
            EnginePacket::Message(SocketPacket::ConnectError { message: "Not authorized".into() })
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(EnginePacket::decode(""), Err(ProtocolError::EmptyPacket));
        assert_eq!(EnginePacket::decode("9"), Err(ProtocolError::UnknownEngineType('9')));
        assert_eq!(
            EnginePacket::decode("45[]"),
            Err(ProtocolError::UnsupportedSocketType('5'))
        );
        assert!(matches!(EnginePacket::decode("42[]"), Err(ProtocolError::Malformed(_))));
        assert!(matches!(EnginePacket::decode("42[1,2]"), Err(ProtocolError::Malformed(_))));
        assert!(matches!(EnginePacket::decode("42{"), Err(ProtocolError::Malformed(_))));
    }
}
