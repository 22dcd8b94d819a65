//! Session and channel configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing knobs for the session state machine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Interval between transport-level keepalive probes while connected.
    pub ping_interval: Duration,
    /// Fixed delay before re-entering `Connecting` after a drop. No backoff
    /// and no retry cap: reconnection continues until shutdown.
    pub reconnect_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(15),
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

/// Buffer sizes for the typed channels between tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Command channel (UI → session task).
    pub command_buffer_size: usize,
    /// Event channel (transport task → session task).
    pub event_buffer_size: usize,
    /// Effect channel (session task → transport task).
    pub effect_buffer_size: usize,
    /// App-event channel (session task → UI).
    pub app_event_buffer_size: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            command_buffer_size: 32,
            event_buffer_size: 128,
            effect_buffer_size: 64,
            app_event_buffer_size: 64,
        }
    }
}
