//! Session lifecycle state machine.
//!
//! [`ChatSession`] is pure: it owns the phase, identity, roster, and
//! conversation target, and turns each command or event into effects and
//! app events without performing any I/O itself. The reactor in
//! `parlor-runtime` executes the effects; this split is what makes every
//! transition unit-testable.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::channel::{AppEvent, Command, Effect, Event, MessageScope};
use crate::config::SessionConfig;
use crate::roster::Roster;
use crate::types::{ConnectionProfile, Identity, UserId};
use crate::wire::{self, InboundEvent, OutboundMessage};

// ----------------------------------------------------------------------------
// Session Phase
// ----------------------------------------------------------------------------

/// Coarse-grained connection lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No connection and none pending. Initial state, and the only terminal
    /// one (after explicit teardown).
    Idle,
    /// Transport open requested, not yet established.
    Connecting,
    /// Transport established, waiting for the server's `Authorized` frame.
    Authorizing,
    /// Authorized; sending enabled, roster live.
    Online,
    /// Connection dropped; a reconnect is scheduled. Never terminal: the
    /// fixed-delay retry continues until shutdown.
    Disconnected,
}

impl SessionPhase {
    pub fn name(self) -> &'static str {
        match self {
            SessionPhase::Idle => "Idle",
            SessionPhase::Connecting => "Connecting",
            SessionPhase::Authorizing => "Authorizing",
            SessionPhase::Online => "Online",
            SessionPhase::Disconnected => "Disconnected",
        }
    }
}

// ----------------------------------------------------------------------------
// Chat Session
// ----------------------------------------------------------------------------

/// Outputs of one state-machine step.
type Step = (Vec<Effect>, Vec<AppEvent>);

/// The session state machine for one logical server connection.
#[derive(Debug)]
pub struct ChatSession {
    config: SessionConfig,
    phase: SessionPhase,
    /// Frozen once a connect attempt begins; reused by every reconnect.
    profile: Option<ConnectionProfile>,
    /// Assigned by the server on authorization; cleared on every drop.
    identity: Option<Identity>,
    roster: Roster,
    /// Current conversation target; broadcast unless a peer is selected.
    target: UserId,
}

impl ChatSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            phase: SessionPhase::Idle,
            profile: None,
            identity: None,
            roster: Roster::new(),
            target: UserId::BROADCAST,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn target(&self) -> UserId {
        self.target
    }

    /// Our own id, or the broadcast sentinel before authorization. Id 0 is
    /// never a real peer, so it is safe as the "no self yet" guard value.
    fn self_id(&self) -> UserId {
        self.identity
            .as_ref()
            .map(|i| i.user_id)
            .unwrap_or(UserId::BROADCAST)
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Process one command from the UI or the reconnect timer.
    pub fn handle_command(&mut self, command: Command) -> Step {
        match command {
            Command::Connect { profile } => self.connect(profile),
            Command::SendText { text } => self.send_text(&text),
            Command::SelectRecipient { user_id } => {
                self.target = user_id;
                (Vec::new(), Vec::new())
            }
            Command::SelectBroadcast => {
                self.target = UserId::BROADCAST;
                (Vec::new(), Vec::new())
            }
            Command::Shutdown => self.shutdown(),
        }
    }

    fn connect(&mut self, profile: ConnectionProfile) -> Step {
        match self.phase {
            SessionPhase::Idle | SessionPhase::Disconnected => {
                let url = profile.connection_url();
                self.profile = Some(profile);
                self.phase = SessionPhase::Connecting;
                debug!(%url, "opening connection");
                (
                    // A manual connect supersedes a pending reconnect; cancel
                    // it so only one attempt is ever in flight.
                    vec![Effect::CancelReconnect, Effect::OpenConnection { url }],
                    vec![AppEvent::PhaseChanged {
                        phase: SessionPhase::Connecting,
                    }],
                )
            }
            phase => {
                warn!(phase = phase.name(), "connect ignored in current phase");
                (Vec::new(), Vec::new())
            }
        }
    }

    fn send_text(&mut self, text: &str) -> Step {
        let text = text.trim();
        if text.is_empty() {
            return (Vec::new(), Vec::new());
        }
        if self.phase != SessionPhase::Online {
            return (
                Vec::new(),
                vec![AppEvent::SessionError {
                    message: "not connected".to_string(),
                }],
            );
        }

        let frame = wire::encode(&OutboundMessage::Chat {
            to_user_id: self.target,
            text: text.to_string(),
        });
        (vec![Effect::SendFrame { text: frame }], Vec::new())
    }

    fn shutdown(&mut self) -> Step {
        self.phase = SessionPhase::Idle;
        self.identity = None;
        self.roster.clear();
        self.target = UserId::BROADCAST;
        (
            vec![
                Effect::StopKeepalive,
                Effect::CancelReconnect,
                Effect::CloseConnection,
            ],
            vec![AppEvent::PhaseChanged {
                phase: SessionPhase::Idle,
            }],
        )
    }

    // ------------------------------------------------------------------------
    // Transport Events
    // ------------------------------------------------------------------------

    /// Process one event from the transport task.
    pub fn handle_event(&mut self, event: Event) -> Step {
        match event {
            Event::Opened => self.on_opened(),
            Event::Closed { reason } => self.on_drop(&reason, None),
            Event::TransportError { error } => {
                let notice = AppEvent::SessionError {
                    message: format!("transport error: {error}"),
                };
                self.on_drop(&error, Some(notice))
            }
            Event::FrameReceived { text } => self.on_frame(&text),
        }
    }

    fn on_opened(&mut self) -> Step {
        if self.phase != SessionPhase::Connecting {
            warn!(phase = self.phase.name(), "stale open event ignored");
            return (Vec::new(), Vec::new());
        }
        // No login frame: authorization is implicit in the connection URL
        // parameters, and the server replies with an `Authorized` frame.
        self.phase = SessionPhase::Authorizing;
        (
            vec![Effect::StartKeepalive {
                interval: self.config.ping_interval,
            }],
            vec![AppEvent::PhaseChanged {
                phase: SessionPhase::Authorizing,
            }],
        )
    }

    /// Shared path for transport close and error: both drop the session into
    /// `Disconnected` and arm the reconnect timer.
    fn on_drop(&mut self, reason: &str, notice: Option<AppEvent>) -> Step {
        match self.phase {
            SessionPhase::Connecting | SessionPhase::Authorizing | SessionPhase::Online => {
                debug!(reason, "connection dropped");
                self.phase = SessionPhase::Disconnected;
                self.identity = None;
                self.roster.clear();

                let mut effects = vec![Effect::StopKeepalive];
                if let Some(profile) = self.profile.clone() {
                    effects.push(Effect::ScheduleReconnect {
                        delay: self.config.reconnect_delay,
                        profile,
                    });
                }

                let mut app_events = Vec::new();
                if let Some(notice) = notice {
                    app_events.push(notice);
                }
                app_events.push(AppEvent::PhaseChanged {
                    phase: SessionPhase::Disconnected,
                });
                (effects, app_events)
            }
            // An error and a close often arrive for the same drop; the
            // second report must not schedule a second reconnect.
            SessionPhase::Disconnected | SessionPhase::Idle => (Vec::new(), Vec::new()),
        }
    }

    fn on_frame(&mut self, text: &str) -> Step {
        match wire::decode(text) {
            Ok(event) => self.on_inbound(event),
            Err(e) => {
                // One bad frame is discarded with a diagnostic; the session
                // and roster stay exactly as they were.
                warn!(error = %e, "discarding malformed frame");
                (
                    Vec::new(),
                    vec![AppEvent::SessionError {
                        message: e.to_string(),
                    }],
                )
            }
        }
    }

    fn on_inbound(&mut self, event: InboundEvent) -> Step {
        match event {
            // Answered immediately and unconditionally while the connection
            // is up: the pong is the only outbound of this step, so nothing
            // can get ahead of it.
            InboundEvent::Ping => (
                vec![Effect::SendFrame {
                    text: wire::encode(&OutboundMessage::pong()),
                }],
                Vec::new(),
            ),
            InboundEvent::Authorized { identity, users } => self.on_authorized(identity, users),
            InboundEvent::Connected { peer } => {
                self.roster.add(peer.clone(), self.self_id());
                (Vec::new(), vec![AppEvent::PeerJoined { peer }])
            }
            InboundEvent::Disconnected { peer } => {
                self.roster.remove(peer.user_id);
                (Vec::new(), vec![AppEvent::PeerLeft { peer }])
            }
            InboundEvent::ConnectionLost { peer } => {
                self.roster.remove(peer.user_id);
                (Vec::new(), vec![AppEvent::PeerConnectionLost { peer }])
            }
            InboundEvent::PublicMessage {
                sender_id,
                sender_name,
                sender_color,
                text,
            } => self.on_message(MessageScope::Broadcast, sender_id, sender_name, sender_color, text),
            InboundEvent::PrivateMessage {
                sender_id,
                sender_name,
                sender_color,
                text,
            } => self.on_message(MessageScope::Private, sender_id, sender_name, sender_color, text),
            InboundEvent::Unknown { action } => {
                warn!(action, "ignoring unknown action");
                (Vec::new(), Vec::new())
            }
        }
    }

    fn on_authorized(&mut self, identity: Identity, users: Vec<Identity>) -> Step {
        if self.phase != SessionPhase::Authorizing {
            warn!(phase = self.phase.name(), "unexpected Authorized frame");
            return (Vec::new(), Vec::new());
        }

        self.phase = SessionPhase::Online;
        // Any snapshot entry carrying our own fresh id is dropped here.
        self.roster.bulk_load(users, identity.user_id);
        self.identity = Some(identity.clone());

        // The profile is confirmed working only now, so this is the one
        // place it gets persisted.
        let mut effects = Vec::new();
        if let Some(profile) = self.profile.clone() {
            effects.push(Effect::PersistProfile { profile });
        }

        (
            effects,
            vec![
                AppEvent::Authorized {
                    identity,
                    roster: self.roster.iter().cloned().collect(),
                },
                AppEvent::PhaseChanged {
                    phase: SessionPhase::Online,
                },
            ],
        )
    }

    fn on_message(
        &mut self,
        scope: MessageScope,
        sender_id: UserId,
        sender_name: String,
        sender_color: String,
        text: String,
    ) -> Step {
        let from_self = sender_id == self.self_id() && !sender_id.is_broadcast();
        let mentions_self = scope == MessageScope::Broadcast
            && self
                .identity
                .as_ref()
                .is_some_and(|i| !i.user_name.is_empty() && text.contains(&i.user_name));

        (
            Vec::new(),
            vec![AppEvent::MessageReceived {
                scope,
                sender_id,
                sender_name,
                sender_color,
                text,
                from_self,
                mentions_self,
            }],
        )
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
