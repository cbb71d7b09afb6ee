//! Wire protocol of the collaboration channel.
//!
//! Every frame is a JSON text object with a `type` tag. Clients send
//! [`ClientMessage`]s, the gateway answers with [`ServerMessage`]s. Relay variants
//! carry the sender's identity so receivers can attribute edits and drop echoes.
//!
//! Mold records and canvas objects travel as opaque JSON: the gateway never
//! interprets them, only the client-side scene does.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// User identifier issued by the account subsystem.
pub type UserId = i64;

/// WebSocket close codes used by the gateway and client.
pub mod close_code {
    /// Client-requested disconnect.
    pub const NORMAL_CLOSURE: u16 = 1000;
    /// Transport dropped without a close frame (never sent on the wire).
    pub const ABNORMAL_CLOSURE: u16 = 1006;
    /// Missing or invalid credential.
    pub const POLICY_VIOLATION: u16 = 1008;
    /// Gateway shutting down.
    pub const SERVICE_RESTART: u16 = 1012;
    /// Peer did not acknowledge a liveness probe in time.
    pub const LIVENESS_TIMEOUT: u16 = 4000;
}

/// Identity attached to every relayed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub user_id: UserId,
    pub email: String,
}

impl UserIdentity {
    pub fn new(user_id: UserId, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
        }
    }
}

/// Mold identifier as it appears on the wire.
///
/// Database ids are numeric, but clients are free to send them as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MoldId {
    Number(i64),
    Text(String),
}

impl fmt::Display for MoldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoldId::Number(n) => write!(f, "{}", n),
            MoldId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for MoldId {
    fn from(value: i64) -> Self {
        MoldId::Number(value)
    }
}

impl From<&str> for MoldId {
    fn from(value: &str) -> Self {
        MoldId::Text(value.to_string())
    }
}

/// Protocol-level parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Not JSON, no `type` tag, or a known type with an unusable payload.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// Well-formed message whose `type` the receiver does not handle.
    #[error("unknown message type '{0}'")]
    UnknownType(String),
}

fn default_scale() -> f64 {
    1.0
}

/// Messages sent by a client to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    MoldCreated {
        #[serde(default)]
        mold: Value,
    },
    MoldUpdated {
        #[serde(default)]
        mold: Value,
    },
    MoldDeleted {
        mold_id: MoldId,
    },
    CanvasObjectAdded {
        object: Value,
    },
    CanvasObjectMoved {
        object_id: String,
        x: f64,
        y: f64,
        #[serde(default)]
        rotation: f64,
        #[serde(default = "default_scale")]
        scale: f64,
    },
    CanvasObjectRemoved {
        object_id: String,
    },
    CanvasCleared,
    Ping,
}

/// What the gateway does with an inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// Relay to every other member of the sender's room.
    Broadcast(ServerMessage),
    /// Answer the sender only.
    Reply(ServerMessage),
}

impl ClientMessage {
    /// Every `type` tag a client may send.
    pub const TYPES: [&'static str; 8] = [
        "mold_created",
        "mold_updated",
        "mold_deleted",
        "canvas_object_added",
        "canvas_object_moved",
        "canvas_object_removed",
        "canvas_cleared",
        "ping",
    ];

    /// Parse a text frame.
    ///
    /// Unknown tags are reported separately from malformed payloads so the gateway
    /// can log them differently.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))?;

        let message_type = match value.get("type").and_then(Value::as_str) {
            Some(t) => t.to_string(),
            None => {
                return Err(ProtocolError::Malformed(
                    "missing `type` field".to_string(),
                ));
            }
        };
        if !Self::TYPES.contains(&message_type.as_str()) {
            return Err(ProtocolError::UnknownType(message_type));
        }

        serde_json::from_value(value).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }

    /// The `type` tag of this message.
    pub fn message_type(&self) -> &'static str {
        match self {
            ClientMessage::MoldCreated { .. } => "mold_created",
            ClientMessage::MoldUpdated { .. } => "mold_updated",
            ClientMessage::MoldDeleted { .. } => "mold_deleted",
            ClientMessage::CanvasObjectAdded { .. } => "canvas_object_added",
            ClientMessage::CanvasObjectMoved { .. } => "canvas_object_moved",
            ClientMessage::CanvasObjectRemoved { .. } => "canvas_object_removed",
            ClientMessage::CanvasCleared => "canvas_cleared",
            ClientMessage::Ping => "ping",
        }
    }

    /// Decide how the gateway answers this message, stamping relayed events with
    /// the sender's identity.
    pub fn route(self, sender: &UserIdentity) -> Route {
        let user_id = sender.user_id;
        let email = sender.email.clone();
        match self {
            ClientMessage::MoldCreated { mold } => Route::Broadcast(ServerMessage::MoldCreated {
                mold,
                user_id,
                email,
            }),
            ClientMessage::MoldUpdated { mold } => Route::Broadcast(ServerMessage::MoldUpdated {
                mold,
                user_id,
                email,
            }),
            ClientMessage::MoldDeleted { mold_id } => {
                Route::Broadcast(ServerMessage::MoldDeleted {
                    mold_id,
                    user_id,
                    email,
                })
            }
            ClientMessage::CanvasObjectAdded { object } => {
                Route::Broadcast(ServerMessage::CanvasObjectAdded {
                    object,
                    user_id,
                    email,
                })
            }
            ClientMessage::CanvasObjectMoved {
                object_id,
                x,
                y,
                rotation,
                scale,
            } => Route::Broadcast(ServerMessage::CanvasObjectMoved {
                object_id,
                x,
                y,
                rotation,
                scale,
                user_id,
            }),
            ClientMessage::CanvasObjectRemoved { object_id } => {
                Route::Broadcast(ServerMessage::CanvasObjectRemoved {
                    object_id,
                    user_id,
                    email,
                })
            }
            ClientMessage::CanvasCleared => {
                Route::Broadcast(ServerMessage::CanvasCleared { user_id, email })
            }
            ClientMessage::Ping => Route::Reply(ServerMessage::Pong),
        }
    }
}

/// Messages sent by the gateway to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    Connected {
        client_id: String,
        message: String,
    },
    UserJoined {
        user_id: UserId,
        email: String,
    },
    UserLeft {
        user_id: UserId,
        email: String,
    },
    MoldCreated {
        mold: Value,
        user_id: UserId,
        email: String,
    },
    MoldUpdated {
        mold: Value,
        user_id: UserId,
        email: String,
    },
    MoldDeleted {
        mold_id: MoldId,
        user_id: UserId,
        email: String,
    },
    CanvasObjectAdded {
        object: Value,
        user_id: UserId,
        email: String,
    },
    CanvasObjectMoved {
        object_id: String,
        x: f64,
        y: f64,
        rotation: f64,
        scale: f64,
        user_id: UserId,
    },
    CanvasObjectRemoved {
        object_id: String,
        user_id: UserId,
        email: String,
    },
    CanvasCleared {
        user_id: UserId,
        email: String,
    },
    Pong,
}

impl ServerMessage {
    /// The `type` tag of this message.
    pub fn message_type(&self) -> &'static str {
        match self {
            ServerMessage::Connected { .. } => "connected",
            ServerMessage::UserJoined { .. } => "user_joined",
            ServerMessage::UserLeft { .. } => "user_left",
            ServerMessage::MoldCreated { .. } => "mold_created",
            ServerMessage::MoldUpdated { .. } => "mold_updated",
            ServerMessage::MoldDeleted { .. } => "mold_deleted",
            ServerMessage::CanvasObjectAdded { .. } => "canvas_object_added",
            ServerMessage::CanvasObjectMoved { .. } => "canvas_object_moved",
            ServerMessage::CanvasObjectRemoved { .. } => "canvas_object_removed",
            ServerMessage::CanvasCleared { .. } => "canvas_cleared",
            ServerMessage::Pong => "pong",
        }
    }

    /// User who originated the event, for relayed and presence events.
    pub fn origin_user_id(&self) -> Option<UserId> {
        match self {
            ServerMessage::UserJoined { user_id, .. }
            | ServerMessage::UserLeft { user_id, .. }
            | ServerMessage::MoldCreated { user_id, .. }
            | ServerMessage::MoldUpdated { user_id, .. }
            | ServerMessage::MoldDeleted { user_id, .. }
            | ServerMessage::CanvasObjectAdded { user_id, .. }
            | ServerMessage::CanvasObjectMoved { user_id, .. }
            | ServerMessage::CanvasObjectRemoved { user_id, .. }
            | ServerMessage::CanvasCleared { user_id, .. } => Some(*user_id),
            ServerMessage::Connected { .. } | ServerMessage::Pong => None,
        }
    }

    /// Serialize to a JSON text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
