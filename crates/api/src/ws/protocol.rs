//! JSON frames exchanged over the notification socket.

use serde::{Deserialize, Serialize};
use sitedesk_core::types::DbId;

/// Frames a client may send. Anything else is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,
    RequestUserInfo,
}

impl ClientMessage {
    /// Parse a text frame; malformed or unknown frames yield `None`.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

/// Frames the server sends.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage<'a> {
    Connection {
        message: &'a str,
        user_id: DbId,
    },
    Pong {
        message: &'a str,
    },
    UserInfo {
        user_id: DbId,
        connections_count: usize,
    },
    MaterialRequest {
        data: &'a serde_json::Value,
    },
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn client_frames_parse_by_type() {
        assert_eq!(ClientMessage::parse(r#"{"type":"ping"}"#), Some(ClientMessage::Ping));
        assert_eq!(
            ClientMessage::parse(r#"{"type":"request_user_info","extra":1}"#),
            Some(ClientMessage::RequestUserInfo)
        );
        assert_eq!(ClientMessage::parse(r#"{"type":"shout"}"#), None);
        assert_eq!(ClientMessage::parse("not json"), None);
    }

    #[test]
    fn server_frames_are_tagged() {
        let connected = ServerMessage::Connection {
            message: "Connected to server",
            user_id: 7,
        };
        assert_eq!(
            serde_json::to_value(&connected).unwrap(),
            json!({"type": "connection", "message": "Connected to server", "user_id": 7})
        );

        let info = ServerMessage::UserInfo {
            user_id: 7,
            connections_count: 2,
        };
        assert_eq!(
            serde_json::to_value(&info).unwrap(),
            json!({"type": "user_info", "user_id": 7, "connections_count": 2})
        );

        let pong = ServerMessage::Pong { message: "Pong" };
        assert_eq!(
            serde_json::to_value(&pong).unwrap(),
            json!({"type": "pong", "message": "Pong"})
        );
    }
}
