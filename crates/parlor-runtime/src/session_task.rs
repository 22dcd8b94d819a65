//! The session reactor task.
//!
//! One task owns the [`ChatSession`] state machine and everything that feeds
//! it: commands from the UI, events from the transport, the keepalive
//! interval, and the reconnect timer. Because all inputs are serialized onto
//! this single loop, the state machine itself needs no locking.
//!
//! Connection effects are forwarded to the transport over the effect
//! channel; timer and persistence effects are executed here.

use std::pin::Pin;

use tokio::time::{interval_at, sleep, Instant, Interval, Sleep};
use tracing::{debug, info, warn};

use parlor_core::channel::{
    AppEvent, AppEventSender, Command, CommandReceiver, Effect, EffectSender, EventReceiver,
};
use parlor_core::error::{ChannelError, Result};
use parlor_core::session::ChatSession;
use parlor_core::types::ConnectionProfile;

use crate::settings::ProfileStore;

/// Armed reconnect: fires once, re-entering `Connecting` with the profile
/// of the dropped connection.
struct ReconnectTimer {
    sleep: Pin<Box<Sleep>>,
    profile: ConnectionProfile,
}

/// The reactor that drives a [`ChatSession`].
pub struct SessionTask {
    session: ChatSession,
    command_receiver: CommandReceiver,
    event_receiver: EventReceiver,
    effect_sender: EffectSender,
    app_event_sender: AppEventSender,
    profile_store: Box<dyn ProfileStore>,
    keepalive: Option<Interval>,
    reconnect: Option<ReconnectTimer>,
    running: bool,
}

impl SessionTask {
    pub fn new(
        session: ChatSession,
        command_receiver: CommandReceiver,
        event_receiver: EventReceiver,
        effect_sender: EffectSender,
        app_event_sender: AppEventSender,
        profile_store: Box<dyn ProfileStore>,
    ) -> Self {
        Self {
            session,
            command_receiver,
            event_receiver,
            effect_sender,
            app_event_sender,
            profile_store,
            keepalive: None,
            reconnect: None,
            running: true,
        }
    }

    /// Run the reactor until shutdown.
    ///
    /// Stops on `Command::Shutdown`, when the command channel closes, or
    /// when a channel to a peer task fails.
    pub async fn run(&mut self) -> Result<()> {
        info!("session task starting");

        while self.running {
            tokio::select! {
                command = self.command_receiver.recv() => {
                    match command {
                        Some(command) => self.process_command(command).await?,
                        None => {
                            info!("command channel closed, shutting down");
                            break;
                        }
                    }
                }

                event = self.event_receiver.recv() => {
                    match event {
                        Some(event) => {
                            let (effects, app_events) = self.session.handle_event(event);
                            self.dispatch(effects, app_events).await?;
                        }
                        None => {
                            info!("event channel closed, shutting down");
                            break;
                        }
                    }
                }

                _ = keepalive_tick(&mut self.keepalive) => {
                    self.dispatch(vec![Effect::SendKeepalive], Vec::new()).await?;
                }

                profile = reconnect_fire(&mut self.reconnect) => {
                    self.reconnect = None;
                    debug!("reconnect timer fired");
                    self.process_command(Command::Connect { profile }).await?;
                }
            }
        }

        info!("session task stopped");
        Ok(())
    }

    async fn process_command(&mut self, command: Command) -> Result<()> {
        let stopping = matches!(command, Command::Shutdown);
        let (effects, app_events) = self.session.handle_command(command);
        self.dispatch(effects, app_events).await?;
        if stopping {
            self.running = false;
        }
        Ok(())
    }

    /// Forward connection effects to the transport, execute timer and
    /// persistence effects locally, and deliver app events to the UI.
    async fn dispatch(&mut self, effects: Vec<Effect>, app_events: Vec<AppEvent>) -> Result<()> {
        for effect in effects {
            match effect {
                Effect::StartKeepalive { interval } => {
                    // First probe one full interval from now, not immediately.
                    self.keepalive = Some(interval_at(Instant::now() + interval, interval));
                }
                Effect::StopKeepalive => {
                    self.keepalive = None;
                }
                Effect::ScheduleReconnect { delay, profile } => {
                    self.reconnect = Some(ReconnectTimer {
                        sleep: Box::pin(sleep(delay)),
                        profile,
                    });
                }
                Effect::CancelReconnect => {
                    self.reconnect = None;
                }
                Effect::PersistProfile { profile } => {
                    // A failed save costs the user their stored settings,
                    // nothing more; the session keeps running.
                    if let Err(e) = self.profile_store.save(&profile) {
                        warn!(error = %e, "failed to persist profile");
                    }
                }
                effect => {
                    self.effect_sender
                        .send(effect)
                        .map_err(|_| ChannelError::Closed)?;
                }
            }
        }

        for app_event in app_events {
            self.app_event_sender
                .send(app_event)
                .await
                .map_err(|_| ChannelError::Closed)?;
        }

        Ok(())
    }
}

/// Resolves on the next keepalive tick; pending while no timer is armed.
async fn keepalive_tick(keepalive: &mut Option<Interval>) {
    match keepalive {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Resolves with the reconnect profile when the timer fires; pending while
/// no reconnect is scheduled.
async fn reconnect_fire(reconnect: &mut Option<ReconnectTimer>) -> ConnectionProfile {
    match reconnect {
        Some(timer) => {
            timer.sleep.as_mut().await;
            timer.profile.clone()
        }
        None => std::future::pending().await,
    }
}
