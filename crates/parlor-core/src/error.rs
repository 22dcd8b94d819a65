//! Error types for the Parlor session protocol.

use crate::wire::DecodeError;

/// Transport failures as seen by the session layer.
///
/// None of these are fatal to the process: the session surfaces them to the
/// user and the reconnect loop takes over.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connect to {url} failed: {reason}")]
    ConnectFailed { url: String, reason: String },
    #[error("websocket error: {reason}")]
    WebSocket { reason: String },
    #[error("transport channels not attached")]
    NotAttached,
    #[error("transport shut down: {reason}")]
    Shutdown { reason: String },
}

/// Inter-task channel failures.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("channel buffer is full")]
    Full,
    #[error("channel is closed")]
    Closed,
}

/// Unified error type for the Parlor core and runtime.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("profile store error: {reason}")]
    Profile { reason: String },
}

pub type Result<T> = std::result::Result<T, ChatError>;
