//! JSON wire codec.
//!
//! The protocol is a single flat JSON object per text frame with an `action`
//! discriminator on inbound frames. Encoding is compact (no whitespace).
//! Decoding is strictly syntactic: a frame that is not a JSON object or has
//! no `action` field is `DecodeError::Malformed`; absent optional fields
//! decode to defaults. Semantic validation (color formats and the like) is
//! the renderer's concern, not the codec's.

use serde::{Deserialize, Serialize};

use crate::types::{Gender, Identity, UserId};

// ----------------------------------------------------------------------------
// Outbound Messages
// ----------------------------------------------------------------------------

/// A message the client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutboundMessage {
    /// Chat payload. `to_user_id` 0 addresses the broadcast channel.
    Chat {
        #[serde(rename = "toUserId")]
        to_user_id: UserId,
        text: String,
    },
    /// Keepalive answer to a server `Ping`.
    Control { action: ControlAction },
}

/// Client-originated control actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlAction {
    Pong,
}

impl OutboundMessage {
    /// The reply every server `Ping` gets.
    pub fn pong() -> Self {
        OutboundMessage::Control {
            action: ControlAction::Pong,
        }
    }
}

/// Encode an outbound message to a compact text frame.
pub fn encode(message: &OutboundMessage) -> String {
    // Both variants are flat structs of string/int fields; serialization
    // cannot fail for them.
    serde_json::to_string(message).unwrap_or_default()
}

// ----------------------------------------------------------------------------
// Inbound Events
// ----------------------------------------------------------------------------

/// A server frame classified by its `action` discriminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Server liveness probe; must be answered with a `Pong` frame.
    Ping,
    /// Authorization confirmation: self identity plus the roster snapshot.
    Authorized {
        identity: Identity,
        users: Vec<Identity>,
    },
    /// A peer joined.
    Connected { peer: Identity },
    /// A peer left cleanly.
    Disconnected { peer: Identity },
    /// The server lost its connection to a peer.
    ConnectionLost { peer: Identity },
    /// A message to the broadcast channel.
    PublicMessage {
        sender_id: UserId,
        sender_name: String,
        sender_color: String,
        text: String,
    },
    /// A message addressed to (or echoed from) this client.
    PrivateMessage {
        sender_id: UserId,
        sender_name: String,
        sender_color: String,
        text: String,
    },
    /// Recognized-but-unhandled discriminator. Logged by the session, never fatal.
    Unknown { action: String },
}

/// Decode failure for a single inbound frame.
///
/// One bad frame must never terminate the session; callers discard the frame
/// and surface a non-fatal diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed frame: {0}")]
    Malformed(String),
}

/// Raw shape of an inbound frame before classification.
#[derive(Debug, Deserialize)]
struct InboundFrame {
    action: Option<String>,
    #[serde(rename = "userId", default)]
    user_id: UserId,
    #[serde(rename = "userName", default)]
    user_name: String,
    #[serde(default)]
    gender: Gender,
    #[serde(rename = "userColor", default)]
    user_color: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    users: Vec<Identity>,
}

impl InboundFrame {
    fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id,
            user_name: self.user_name.clone(),
            gender: self.gender,
            user_color: self.user_color.clone(),
        }
    }
}

/// Decode a text frame into an [`InboundEvent`].
pub fn decode(frame: &str) -> Result<InboundEvent, DecodeError> {
    let frame: InboundFrame =
        serde_json::from_str(frame).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let action = frame
        .action
        .as_deref()
        .ok_or_else(|| DecodeError::Malformed("missing action field".to_string()))?;

    let event = match action {
        "Ping" => InboundEvent::Ping,
        "Authorized" => InboundEvent::Authorized {
            identity: frame.identity(),
            users: frame.users,
        },
        "Connected" => InboundEvent::Connected {
            peer: frame.identity(),
        },
        "Disconnected" => InboundEvent::Disconnected {
            peer: frame.identity(),
        },
        "ConnectionLost" => InboundEvent::ConnectionLost {
            peer: frame.identity(),
        },
        "PublicMessage" => InboundEvent::PublicMessage {
            sender_id: frame.user_id,
            sender_name: frame.user_name,
            sender_color: frame.user_color,
            text: frame.text,
        },
        "PrivateMessage" => InboundEvent::PrivateMessage {
            sender_id: frame.user_id,
            sender_name: frame.user_name,
            sender_color: frame.user_color,
            text: frame.text,
        },
        other => InboundEvent::Unknown {
            action: other.to_string(),
        },
    };

    Ok(event)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
