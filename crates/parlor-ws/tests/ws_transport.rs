//! Integration tests for the WebSocket transport against a local server.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

use parlor_core::channel::{
    create_effect_channel, create_event_channel, Effect, Event, EventReceiver,
};
use parlor_core::config::ChannelConfig;
use parlor_core::transport::TransportTask;
use parlor_ws::WsTransportTask;

const WAIT: Duration = Duration::from_secs(5);

async fn next_event(events: &mut EventReceiver) -> Event {
    timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

#[tokio::test]
async fn connects_pumps_frames_both_ways_and_closes() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        ws.send(Message::Text(r#"{"action":"Ping"}"#.to_string()))
            .await
            .unwrap();

        // First text frame back from the client.
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return text,
                Some(Ok(_)) => continue,
                other => panic!("server expected text frame, got {other:?}"),
            }
        }
    });

    let config = ChannelConfig::default();
    let (event_sender, mut events) = create_event_channel(&config);
    let (effect_sender, effect_receiver) = create_effect_channel(&config);

    let mut transport = WsTransportTask::new();
    transport
        .attach_channels(event_sender, effect_receiver)
        .unwrap();
    let task = tokio::spawn(async move { transport.run().await });

    effect_sender
        .send(Effect::OpenConnection {
            url: format!("ws://{addr}"),
        })
        .unwrap();

    assert_eq!(next_event(&mut events).await, Event::Opened);
    assert_eq!(
        next_event(&mut events).await,
        Event::FrameReceived {
            text: r#"{"action":"Ping"}"#.to_string()
        }
    );

    effect_sender
        .send(Effect::SendFrame {
            text: r#"{"action":"Pong"}"#.to_string(),
        })
        .unwrap();
    let received = timeout(WAIT, server).await.unwrap().unwrap();
    assert_eq!(received, r#"{"action":"Pong"}"#);

    effect_sender.send(Effect::CloseConnection).unwrap();
    assert!(matches!(
        next_event(&mut events).await,
        Event::Closed { .. }
    ));

    // Closing the effect channel is the shutdown signal.
    drop(effect_sender);
    timeout(WAIT, task).await.unwrap().unwrap().unwrap();
}

#[tokio::test]
async fn failed_connect_is_reported_not_fatal() {
    let config = ChannelConfig::default();
    let (event_sender, mut events) = create_event_channel(&config);
    let (effect_sender, effect_receiver) = create_effect_channel(&config);

    let mut transport = WsTransportTask::new();
    transport
        .attach_channels(event_sender, effect_receiver)
        .unwrap();
    let task = tokio::spawn(async move { transport.run().await });

    // A port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    effect_sender
        .send(Effect::OpenConnection {
            url: format!("ws://{addr}"),
        })
        .unwrap();

    assert!(matches!(
        next_event(&mut events).await,
        Event::TransportError { .. }
    ));

    // The task survives the failure and can try again later.
    assert!(!task.is_finished());
    drop(effect_sender);
    timeout(WAIT, task).await.unwrap().unwrap().unwrap();
}

#[tokio::test]
async fn server_initiated_close_is_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.close(None).await.unwrap();
    });

    let config = ChannelConfig::default();
    let (event_sender, mut events) = create_event_channel(&config);
    let (effect_sender, effect_receiver) = create_effect_channel(&config);

    let mut transport = WsTransportTask::new();
    transport
        .attach_channels(event_sender, effect_receiver)
        .unwrap();
    let task = tokio::spawn(async move { transport.run().await });

    effect_sender
        .send(Effect::OpenConnection {
            url: format!("ws://{addr}"),
        })
        .unwrap();

    assert_eq!(next_event(&mut events).await, Event::Opened);
    assert!(matches!(
        next_event(&mut events).await,
        Event::Closed { .. }
    ));

    drop(effect_sender);
    timeout(WAIT, task).await.unwrap().unwrap().unwrap();
}
