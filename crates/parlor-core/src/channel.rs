//! Typed channel protocol between tasks.
//!
//! All inter-task communication flows through four message types, each with
//! its own bounded channel:
//!
//! - [`Command`]: UI/external → session task
//! - [`Event`]: transport task → session task
//! - [`Effect`]: session task → transport task (side effects only)
//! - [`AppEvent`]: session task → UI (state changes only)
//!
//! The session task is the only consumer of commands and events, so every
//! input is serialized onto one reactor and state needs no locking.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ChannelConfig;
use crate::types::{ConnectionProfile, Identity, UserId};

// ----------------------------------------------------------------------------
// Command: UI/External → Session Task
// ----------------------------------------------------------------------------

/// Commands sent from the UI and external systems to the session task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Open a connection with the given profile. Accepted in `Idle` and
    /// `Disconnected`; a manual connect supersedes a pending reconnect.
    Connect { profile: ConnectionProfile },
    /// Send `text` to the currently selected conversation target.
    SendText { text: String },
    /// Address subsequent sends to one peer.
    SelectRecipient { user_id: UserId },
    /// Return subsequent sends to the broadcast channel.
    SelectBroadcast,
    /// Tear the session down: close the transport, cancel timers, stop.
    Shutdown,
}

// ----------------------------------------------------------------------------
// Event: Transport → Session Task
// ----------------------------------------------------------------------------

/// Events sent from the transport task to the session task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// The connection is open; authorization is now pending.
    Opened,
    /// The connection closed (remote close or local error follow-up).
    Closed { reason: String },
    /// A transport-level failure. Surfaced to the user, then the reconnect
    /// loop handles recovery.
    TransportError { error: String },
    /// A whole text frame arrived. The transport guarantees ordering.
    FrameReceived { text: String },
}

// ----------------------------------------------------------------------------
// Effect: Session Task → Transport (and reactor-local timers)
// ----------------------------------------------------------------------------

/// Effects emitted by the session state machine.
///
/// Connection/frame effects are forwarded to the transport task; timer and
/// persistence effects are executed locally by the session task's reactor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// Open a connection to the encoded target URL.
    OpenConnection { url: String },
    /// Send one text frame.
    SendFrame { text: String },
    /// Send a transport-level keepalive probe (independent of the JSON
    /// `Ping`/`Pong` exchange, which is server-initiated).
    SendKeepalive,
    /// Close the connection.
    CloseConnection,
    /// Start the periodic keepalive timer. Reactor-local.
    StartKeepalive { interval: Duration },
    /// Stop the keepalive timer. Idempotent. Reactor-local.
    StopKeepalive,
    /// Arm the one-shot reconnect timer; it re-enters `Connecting` with
    /// `profile` unless cancelled first. Reactor-local.
    ScheduleReconnect {
        delay: Duration,
        profile: ConnectionProfile,
    },
    /// Cancel a pending reconnect timer. Reactor-local.
    CancelReconnect,
    /// Persist the now-confirmed connection profile. Reactor-local.
    PersistProfile { profile: ConnectionProfile },
}

// ----------------------------------------------------------------------------
// AppEvent: Session Task → UI
// ----------------------------------------------------------------------------

/// Whether a chat message went to everyone or just this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageScope {
    Broadcast,
    Private,
}

/// State changes the UI needs to know about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppEvent {
    /// The session moved to a new lifecycle phase.
    PhaseChanged { phase: crate::session::SessionPhase },
    /// The server authorized us; roster carries the initial snapshot.
    Authorized {
        identity: Identity,
        roster: Vec<Identity>,
    },
    /// A peer joined the chat.
    PeerJoined { peer: Identity },
    /// A peer left the chat.
    PeerLeft { peer: Identity },
    /// The server lost its connection to a peer. Same roster effect as
    /// `PeerLeft`; the distinction is presentation only.
    PeerConnectionLost { peer: Identity },
    /// A chat message arrived.
    MessageReceived {
        scope: MessageScope,
        sender_id: UserId,
        sender_name: String,
        sender_color: String,
        text: String,
        /// Sender is this client (private-message echo).
        from_self: bool,
        /// The text mentions this client's display name; the UI may beep.
        mentions_self: bool,
    },
    /// A non-fatal problem worth showing (bad frame, socket error, ...).
    SessionError { message: String },
}

// ----------------------------------------------------------------------------
// Channel Aliases and Constructors
// ----------------------------------------------------------------------------

pub type CommandSender = tokio::sync::mpsc::Sender<Command>;
pub type CommandReceiver = tokio::sync::mpsc::Receiver<Command>;
pub type EventSender = tokio::sync::mpsc::Sender<Event>;
pub type EventReceiver = tokio::sync::mpsc::Receiver<Event>;
pub type EffectSender = tokio::sync::broadcast::Sender<Effect>;
pub type EffectReceiver = tokio::sync::broadcast::Receiver<Effect>;
pub type AppEventSender = tokio::sync::mpsc::Sender<AppEvent>;
pub type AppEventReceiver = tokio::sync::mpsc::Receiver<AppEvent>;

/// Create the bounded command channel (UI → session task).
pub fn create_command_channel(config: &ChannelConfig) -> (CommandSender, CommandReceiver) {
    tokio::sync::mpsc::channel(config.command_buffer_size)
}

/// Create the bounded event channel (transport → session task).
pub fn create_event_channel(config: &ChannelConfig) -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::channel(config.event_buffer_size)
}

/// Create the broadcast effect channel (session task → transports).
///
/// Additional receivers come from [`create_effect_receiver`].
pub fn create_effect_channel(config: &ChannelConfig) -> (EffectSender, EffectReceiver) {
    tokio::sync::broadcast::channel(config.effect_buffer_size)
}

/// Subscribe a new effect receiver; this is how a transport gets its feed.
pub fn create_effect_receiver(effect_sender: &EffectSender) -> EffectReceiver {
    effect_sender.subscribe()
}

/// Create the bounded app-event channel (session task → UI).
pub fn create_app_event_channel(config: &ChannelConfig) -> (AppEventSender, AppEventReceiver) {
    tokio::sync::mpsc::channel(config.app_event_buffer_size)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
