//! Realtime wire messages for the `/ws` channel.
//!
//! ARCHITECTURE
//! ============
//! Every websocket text frame is one JSON object tagged by `type`. Clients
//! send `join` and `drawing`; the server pushes `user_joined`, `user_left`
//! and relayed `drawing` messages. There is no request/response pairing:
//! the channel is a fan-out relay, so nothing is acknowledged.

use serde::{Deserialize, Serialize};

use crate::drawing::{DrawingError, DrawingEvent};

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code attached to structured log lines and API errors.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;
}

// =============================================================================
// TYPES
// =============================================================================

/// Messages a client may send.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    Join { board_id: i64, user_id: i64 },
    Drawing { event: DrawingEvent },
}

/// Messages the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    UserJoined { user_id: i64, active_sessions: usize },
    #[serde(rename_all = "camelCase")]
    UserLeft { user_id: i64, active_sessions: usize },
    Drawing { event: DrawingEvent },
}

#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("invalid message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid drawing event: {0}")]
    InvalidEvent(#[from] DrawingError),
}

impl ErrorCode for MessageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "E_MALFORMED",
            Self::InvalidEvent(e) => e.error_code(),
        }
    }
}

// =============================================================================
// CODEC
// =============================================================================

impl ClientMessage {
    /// Decode one inbound text frame and validate any carried event.
    ///
    /// # Errors
    ///
    /// Returns `Malformed` for bad JSON, an unknown `type`, or missing
    /// fields, and `InvalidEvent` when a drawing event breaks an invariant.
    pub fn parse(text: &str) -> Result<Self, MessageError> {
        let msg: Self = serde_json::from_str(text)?;
        if let Self::Drawing { event } = &msg {
            event.validate()?;
        }
        Ok(msg)
    }
}

impl ServerMessage {
    /// Encode for a websocket text frame.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the payload cannot be encoded.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
