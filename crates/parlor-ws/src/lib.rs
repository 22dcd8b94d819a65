//! # Parlor WebSocket Transport
//!
//! [`WsTransportTask`] implements [`TransportTask`] over a real WebSocket
//! connection using `tokio-tungstenite`. It consumes connection effects,
//! reports everything that happens on the socket as events, and carries no
//! protocol knowledge: frames pass through as opaque text in both
//! directions.
//!
//! Connection failures are events, not errors. `run` only returns when the
//! effect channel closes, which is the runtime's shutdown signal.

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::broadcast::error::RecvError;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use parlor_core::channel::{Effect, EffectReceiver, Event, EventSender};
use parlor_core::error::{Result, TransportError};
use parlor_core::transport::TransportTask;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// What a connected session segment ended with.
enum SegmentEnd {
    /// The connection dropped or was closed; go back to waiting for the
    /// next `OpenConnection`.
    Dropped,
    /// The effect channel closed; the whole task is done.
    Shutdown,
}

/// WebSocket transport task.
///
/// Owns at most one connection at a time. While disconnected it waits for
/// an `OpenConnection` effect; while connected it pumps frames both ways
/// until the socket drops or a `CloseConnection` effect arrives.
pub struct WsTransportTask {
    event_sender: Option<EventSender>,
    effect_receiver: Option<EffectReceiver>,
}

impl WsTransportTask {
    pub fn new() -> Self {
        Self {
            event_sender: None,
            effect_receiver: None,
        }
    }
}

impl Default for WsTransportTask {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransportTask for WsTransportTask {
    fn attach_channels(
        &mut self,
        event_sender: EventSender,
        effect_receiver: EffectReceiver,
    ) -> Result<()> {
        self.event_sender = Some(event_sender);
        self.effect_receiver = Some(effect_receiver);
        Ok(())
    }

    async fn run(&mut self) -> Result<()> {
        let event_sender = self
            .event_sender
            .take()
            .ok_or(TransportError::NotAttached)?;
        let mut effect_receiver = self
            .effect_receiver
            .take()
            .ok_or(TransportError::NotAttached)?;

        loop {
            // Disconnected: nothing to do until the session asks for a
            // connection or the runtime shuts down.
            let url = match await_open(&mut effect_receiver).await {
                Some(url) => url,
                None => return Ok(()),
            };

            debug!(%url, "connecting");
            let ws = match connect_async(url.as_str()).await {
                Ok((ws, _response)) => ws,
                Err(e) => {
                    warn!(%url, error = %e, "connect failed");
                    // The session schedules the reconnect; nothing to do
                    // here but report.
                    if !report(
                        &event_sender,
                        Event::TransportError {
                            error: format!("connect to {url} failed: {e}"),
                        },
                    )
                    .await
                    {
                        return Ok(());
                    }
                    continue;
                }
            };

            if !report(&event_sender, Event::Opened).await {
                return Ok(());
            }

            let (sink, stream) = ws.split();
            match drive_connection(&event_sender, &mut effect_receiver, sink, stream).await {
                SegmentEnd::Dropped => continue,
                SegmentEnd::Shutdown => return Ok(()),
            }
        }
    }
}

/// Wait for the next `OpenConnection` effect. Returns `None` when the
/// effect channel closes.
async fn await_open(effect_receiver: &mut EffectReceiver) -> Option<String> {
    loop {
        match effect_receiver.recv().await {
            Ok(Effect::OpenConnection { url }) => return Some(url),
            // Frame and close effects without a connection are stale
            // leftovers from a drop race; discard them.
            Ok(effect) => debug!(?effect, "effect ignored while disconnected"),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "effect receiver lagged while disconnected");
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

/// Pump one established connection until it ends.
async fn drive_connection(
    event_sender: &EventSender,
    effect_receiver: &mut EffectReceiver,
    mut sink: WsSink,
    mut stream: WsStream,
) -> SegmentEnd {
    loop {
        tokio::select! {
            effect = effect_receiver.recv() => match effect {
                Ok(Effect::SendFrame { text }) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        warn!(error = %e, "send failed");
                        if !report(event_sender, Event::TransportError {
                            error: format!("send failed: {e}"),
                        })
                        .await
                        {
                            return SegmentEnd::Shutdown;
                        }
                        return SegmentEnd::Dropped;
                    }
                }
                Ok(Effect::SendKeepalive) => {
                    if let Err(e) = sink.send(Message::Ping(Vec::new())).await {
                        warn!(error = %e, "keepalive failed");
                        if !report(event_sender, Event::TransportError {
                            error: format!("keepalive failed: {e}"),
                        })
                        .await
                        {
                            return SegmentEnd::Shutdown;
                        }
                        return SegmentEnd::Dropped;
                    }
                }
                Ok(Effect::CloseConnection) => {
                    let _ = sink.send(Message::Close(None)).await;
                    let _ = sink.close().await;
                    if !report(event_sender, Event::Closed {
                        reason: "closed by client".to_string(),
                    })
                    .await
                    {
                        return SegmentEnd::Shutdown;
                    }
                    return SegmentEnd::Dropped;
                }
                Ok(Effect::OpenConnection { url }) => {
                    warn!(%url, "open requested while already connected; ignored");
                }
                // Timer and persistence effects are the reactor's business.
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "effect receiver lagged");
                }
                Err(RecvError::Closed) => {
                    let _ = sink.send(Message::Close(None)).await;
                    let _ = sink.close().await;
                    return SegmentEnd::Shutdown;
                }
            },
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if !report(event_sender, Event::FrameReceived { text }).await {
                        return SegmentEnd::Shutdown;
                    }
                }
                // tungstenite answers pings internally; pongs confirm our
                // keepalives and need no action.
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| f.reason.to_string())
                        .filter(|r| !r.is_empty())
                        .unwrap_or_else(|| "closed by server".to_string());
                    if !report(event_sender, Event::Closed { reason }).await {
                        return SegmentEnd::Shutdown;
                    }
                    return SegmentEnd::Dropped;
                }
                // The protocol is text-only; binary frames are not ours.
                Some(Ok(other)) => debug!(?other, "non-text frame ignored"),
                Some(Err(e)) => {
                    warn!(error = %e, "socket error");
                    if !report(event_sender, Event::TransportError {
                        error: e.to_string(),
                    })
                    .await
                    {
                        return SegmentEnd::Shutdown;
                    }
                    return SegmentEnd::Dropped;
                }
                None => {
                    if !report(event_sender, Event::Closed {
                        reason: "connection ended".to_string(),
                    })
                    .await
                    {
                        return SegmentEnd::Shutdown;
                    }
                    return SegmentEnd::Dropped;
                }
            },
        }
    }
}

/// Forward an event to the session task. Returns `false` when the session
/// is gone, which means the transport should stop too.
async fn report(event_sender: &EventSender, event: Event) -> bool {
    event_sender.send(event).await.is_ok()
}
