//! WebSocket Message Types
//!
//! Gateway frame formats. Every frame is `{op, d?, s?, t?}`; dispatches
//! (`op` 0) carry an event name in `t` and a per-connection sequence in `s`.
//! The types derive both directions so the client reuses them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event name of the dispatch that follows a successful IDENTIFY
pub const READY_EVENT: &str = "READY";

/// Gateway opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    /// Event dispatch
    Dispatch = 0,
    /// Heartbeat
    Heartbeat = 1,
    /// Identify
    Identify = 2,
    /// Join additional course rooms
    Subscribe = 3,
    /// Leave course rooms
    Unsubscribe = 4,
    /// Invalid session
    InvalidSession = 9,
    /// Hello
    Hello = 10,
    /// Heartbeat ACK
    HeartbeatAck = 11,
}

impl OpCode {
    pub fn from_u8(op: u8) -> Option<Self> {
        match op {
            0 => Some(Self::Dispatch),
            1 => Some(Self::Heartbeat),
            2 => Some(Self::Identify),
            3 => Some(Self::Subscribe),
            4 => Some(Self::Unsubscribe),
            9 => Some(Self::InvalidSession),
            10 => Some(Self::Hello),
            11 => Some(Self::HeartbeatAck),
            _ => None,
        }
    }
}

/// Client to server frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayReceive {
    pub op: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<serde_json::Value>,
}

impl GatewayReceive {
    pub fn heartbeat() -> Self {
        Self {
            op: OpCode::Heartbeat as u8,
            d: None,
        }
    }

    pub fn identify(payload: &IdentifyPayload) -> Self {
        Self {
            op: OpCode::Identify as u8,
            d: serde_json::to_value(payload).ok(),
        }
    }
}

/// Server to client frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySend {
    pub op: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

impl GatewaySend {
    pub fn hello(heartbeat_interval: u64) -> Self {
        Self {
            op: OpCode::Hello as u8,
            d: serde_json::to_value(HelloPayload { heartbeat_interval }).ok(),
            s: None,
            t: None,
        }
    }

    pub fn heartbeat_ack() -> Self {
        Self {
            op: OpCode::HeartbeatAck as u8,
            d: None,
            s: None,
            t: None,
        }
    }

    pub fn invalid_session() -> Self {
        Self {
            op: OpCode::InvalidSession as u8,
            d: Some(serde_json::Value::Bool(false)),
            s: None,
            t: None,
        }
    }

    pub fn dispatch(event: &str, sequence: u64, payload: serde_json::Value) -> Self {
        Self {
            op: OpCode::Dispatch as u8,
            d: Some(payload),
            s: Some(sequence),
            t: Some(event.to_string()),
        }
    }

    pub fn opcode(&self) -> Option<OpCode> {
        OpCode::from_u8(self.op)
    }
}

/// Hello payload (op 10)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelloPayload {
    pub heartbeat_interval: u64,
}

/// Ready payload (dispatch READY)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyPayload {
    pub session_id: String,
    pub user_id: Option<Uuid>,
    pub courses: Vec<String>,
}

/// Identify payload (op 2). The token is optional: anonymous viewers may
/// follow a course room.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentifyPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default)]
    pub courses: Vec<String>,
}

/// Subscribe / unsubscribe payload (op 3 / op 4)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscribePayload {
    #[serde(default)]
    pub courses: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_frame_shape() {
        let json = serde_json::to_value(GatewaySend::hello(41250)).unwrap();
        assert_eq!(json, serde_json::json!({"op": 10, "d": {"heartbeatInterval": 41250}}));
    }

    #[test]
    fn test_identify_without_token() {
        let frame = GatewayReceive::identify(&IdentifyPayload {
            token: None,
            courses: vec!["rust-101".into()],
        });
        let json = serde_json::to_value(frame).unwrap();
        assert_eq!(json, serde_json::json!({"op": 2, "d": {"courses": ["rust-101"]}}));
    }

    #[test]
    fn test_opcode_round_trip() {
        assert_eq!(OpCode::from_u8(3), Some(OpCode::Subscribe));
        assert_eq!(OpCode::from_u8(5), None);
    }
}
