//! # Parlor Runtime
//!
//! Wires the pieces of the Parlor chat client together: spawns the
//! transport task and the session reactor, connects them over bounded
//! channels, and persists the connection profile.
//!
//! The embedding UI talks to [`ChatRuntime`] through a [`Command`] sender
//! and an [`AppEvent`] receiver; everything else runs in background tasks.
//!
//! [`Command`]: parlor_core::channel::Command
//! [`AppEvent`]: parlor_core::channel::AppEvent

pub mod runtime;
pub mod session_task;
pub mod settings;

pub use runtime::{ChatRuntime, RuntimeConfig};
pub use session_task::SessionTask;
pub use settings::{MemoryProfileStore, ProfileError, ProfileStore, TomlProfileStore};
