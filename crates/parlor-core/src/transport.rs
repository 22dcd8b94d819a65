//! Transport task abstraction.
//!
//! A transport owns one connection end-to-end: it executes connection
//! effects and reports everything that happens as events. The session task
//! never touches sockets, and a transport never touches session state, so
//! either side can be swapped (real WebSocket, in-memory mock) without the
//! other noticing.

use async_trait::async_trait;

use crate::channel::{EffectReceiver, EventSender};
use crate::error::Result;

/// A long-running task that bridges the effect/event channels to a
/// concrete connection.
///
/// Lifecycle: construct, [`attach_channels`](TransportTask::attach_channels),
/// then [`run`](TransportTask::run) until the effect channel closes.
#[async_trait]
pub trait TransportTask: Send {
    /// Wire the task to the session's channels. Must be called exactly once
    /// before [`run`](TransportTask::run).
    fn attach_channels(
        &mut self,
        event_sender: EventSender,
        effect_receiver: EffectReceiver,
    ) -> Result<()>;

    /// Drive the transport until shutdown. Returns when the effect channel
    /// closes; connection failures are reported as events, not returned.
    async fn run(&mut self) -> Result<()>;
}
