//! # Parlor Core
//!
//! Pure protocol and session logic for the Parlor chat client: the JSON wire
//! codec, the session lifecycle state machine, the peer roster, and the typed
//! channel protocol that connects the session task to transports and the UI.
//!
//! This crate performs no I/O. Connections live in `parlor-ws`; the reactor
//! that drives the state machine and its timers lives in `parlor-runtime`.
//!
//! ## Architecture
//!
//! Tasks communicate only through bounded channels:
//!
//! ```text
//! UI ──Command──▶ session task ──Effect──▶ transport task
//! UI ◀─AppEvent── session task ◀──Event─── transport task
//! ```
//!
//! [`ChatSession`] is the deterministic core: each command or event produces
//! a list of effects and app events, which makes every protocol rule
//! testable without a socket or a clock.

pub mod channel;
pub mod config;
pub mod error;
pub mod roster;
pub mod session;
pub mod transport;
pub mod types;
pub mod wire;

pub use channel::{AppEvent, Command, Effect, Event, MessageScope};
pub use config::{ChannelConfig, SessionConfig};
pub use error::{ChannelError, ChatError, Result, TransportError};
pub use roster::Roster;
pub use session::{ChatSession, SessionPhase};
pub use transport::TransportTask;
pub use types::{ConnectionProfile, Gender, Identity, UserId};
pub use wire::{DecodeError, InboundEvent, OutboundMessage};
