//! Runtime wiring: channels, task spawning, and the client handle.

use tokio::task::JoinHandle;
use tracing::{error, info};

use parlor_core::channel::{
    create_app_event_channel, create_command_channel, create_effect_channel,
    create_effect_receiver, create_event_channel, AppEventReceiver, Command, CommandSender,
};
use parlor_core::config::{ChannelConfig, SessionConfig};
use parlor_core::error::{ChannelError, ChatError, Result};
use parlor_core::session::ChatSession;
use parlor_core::transport::TransportTask;

use parlor_ws::WsTransportTask;

use crate::session_task::SessionTask;
use crate::settings::ProfileStore;

/// Everything the runtime needs to start.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub session: SessionConfig,
    pub channels: ChannelConfig,
}

/// Handle to a running chat client.
///
/// Created by [`ChatRuntime::start`]; owns the spawned session and transport
/// tasks. The UI drives it through [`commands`](ChatRuntime::commands) and
/// the app-event receiver returned at startup.
pub struct ChatRuntime {
    command_sender: CommandSender,
    session_handle: JoinHandle<Result<()>>,
    transport_handle: JoinHandle<Result<()>>,
}

impl ChatRuntime {
    /// Start the runtime over the real WebSocket transport.
    pub fn start(
        config: RuntimeConfig,
        profile_store: Box<dyn ProfileStore>,
    ) -> Result<(Self, AppEventReceiver)> {
        Self::start_with_transport(config, WsTransportTask::new(), profile_store)
    }

    /// Start the runtime over any transport. Tests use this with in-memory
    /// transports.
    pub fn start_with_transport<T>(
        config: RuntimeConfig,
        mut transport: T,
        profile_store: Box<dyn ProfileStore>,
    ) -> Result<(Self, AppEventReceiver)>
    where
        T: TransportTask + 'static,
    {
        let (command_sender, command_receiver) = create_command_channel(&config.channels);
        let (event_sender, event_receiver) = create_event_channel(&config.channels);
        let (effect_sender, _effect_receiver) = create_effect_channel(&config.channels);
        let (app_event_sender, app_event_receiver) = create_app_event_channel(&config.channels);

        transport.attach_channels(event_sender, create_effect_receiver(&effect_sender))?;
        let transport_handle = tokio::spawn(async move {
            let result = transport.run().await;
            if let Err(ref e) = result {
                error!(error = %e, "transport task failed");
            }
            result
        });

        let mut session_task = SessionTask::new(
            ChatSession::new(config.session),
            command_receiver,
            event_receiver,
            effect_sender,
            app_event_sender,
            profile_store,
        );
        let session_handle = tokio::spawn(async move {
            let result = session_task.run().await;
            if let Err(ref e) = result {
                error!(error = %e, "session task failed");
            }
            result
        });

        info!("runtime started");
        Ok((
            Self {
                command_sender,
                session_handle,
                transport_handle,
            },
            app_event_receiver,
        ))
    }

    /// Sender for UI commands. Clone freely.
    pub fn commands(&self) -> CommandSender {
        self.command_sender.clone()
    }

    /// Send one command to the session task.
    pub async fn send_command(&self, command: Command) -> Result<()> {
        self.command_sender
            .send(command)
            .await
            .map_err(|_| ChatError::Channel(ChannelError::Closed))
    }

    /// Shut the runtime down and wait for both tasks to finish.
    ///
    /// The session task tears the connection down and exits; dropping its
    /// effect sender is what releases the transport task.
    pub async fn shutdown(self) -> Result<()> {
        // A closed command channel means the session already stopped.
        let _ = self.command_sender.send(Command::Shutdown).await;

        let session_result = self
            .session_handle
            .await
            .map_err(|_| ChatError::Channel(ChannelError::Closed))?;
        let transport_result = self
            .transport_handle
            .await
            .map_err(|_| ChatError::Channel(ChannelError::Closed))?;

        session_result?;
        transport_result?;
        info!("runtime stopped");
        Ok(())
    }
}
