use std::time::Duration;

use chat_client::{
    config::{parse_endpoint, ClientOptions},
    display::TerminalDisplay,
    render::HtmlConverter,
    transport::{self, Channel, ChannelEvent, Connection, WsChannel},
    ChatConnectionClient, ChatError,
};
use chat_server::{config::AppConfig, serve, AppState};
use chat_shared::{ConnectionState, Origin};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::protocol::Message};

type Client = ChatConnectionClient<TerminalDisplay, WsChannel>;

async fn start_server(config: AppConfig) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, AppState::new(config).await));
    format!("ws://{}/chat", addr)
}

fn client_for(url: &str) -> (Client, mpsc::UnboundedReceiver<ChannelEvent>) {
    let endpoint = parse_endpoint(url).unwrap();
    let Connection { channel, events } = transport::connect(endpoint);
    let mut client = ChatConnectionClient::new(
        TerminalDisplay::new(url),
        channel,
        Box::new(HtmlConverter::default()),
        ClientOptions::default(),
    );
    client.initialize();
    (client, events)
}

async fn pump(client: &mut Client, events: &mut mpsc::UnboundedReceiver<ChannelEvent>) {
    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for a channel event")
        .expect("event stream ended");
    client.handle_event(event);
}

#[tokio::test]
async fn round_trip_through_the_server() {
    let url = start_server(AppConfig::default()).await;
    let (mut client, mut events) = client_for(&url);
    assert_eq!(client.display().status(), ConnectionState::Connecting);

    pump(&mut client, &mut events).await;
    assert_eq!(client.state(), ConnectionState::Open);
    assert_eq!(client.display().status().label(), "Connected");

    client.input_mut().set_value("# Hello\n\nWorld");
    client.send_current_input();
    assert_eq!(client.input().value(), "");

    pump(&mut client, &mut events).await;
    let messages = client.display().messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].message.origin, Origin::Bot);
    assert_eq!(messages[0].message.body, "# Hello\n\nWorld");
    assert_eq!(messages[0].content, "<h1>Hello</h1>\n<p>World</p>\n");
    assert_eq!(client.display().selected(), Some(0));
}

#[tokio::test]
async fn frames_are_rendered_in_arrival_order() {
    let url = start_server(AppConfig::default()).await;
    let (mut client, mut events) = client_for(&url);
    pump(&mut client, &mut events).await;

    for text in ["one", "two", "three"] {
        client.input_mut().set_value(text);
        client.send_current_input();
    }
    for _ in 0..3 {
        pump(&mut client, &mut events).await;
    }

    let bodies: Vec<_> = client
        .display()
        .messages()
        .iter()
        .map(|m| m.message.body.as_str())
        .collect();
    assert_eq!(bodies, ["one", "two", "three"]);
    assert_eq!(client.display().selected(), Some(2));
}

#[tokio::test]
async fn unreachable_server_never_shows_connected() {
    // Bind then release a port so nothing is listening on it
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (mut client, mut events) = client_for(&format!("ws://{}/chat", addr));
    pump(&mut client, &mut events).await;

    assert_eq!(client.state(), ConnectionState::Closed);
    assert_eq!(client.display().status().label(), "Disconnected");
    assert!(events.recv().await.is_none());

    // The transmit is still attempted and fails quietly
    client.input_mut().set_value("anyone?");
    client.send_current_input();
    assert_eq!(client.input().value(), "");
    assert_eq!(client.state(), ConnectionState::Closed);
    assert!(client.display().messages().is_empty());
}

#[tokio::test]
async fn frames_sent_while_connecting_go_out_after_the_handshake() {
    let url = start_server(AppConfig::default()).await;
    let (mut client, mut events) = client_for(&url);

    client.input_mut().set_value("early");
    client.send_current_input();
    assert_eq!(client.state(), ConnectionState::Connecting);

    pump(&mut client, &mut events).await;
    assert_eq!(client.state(), ConnectionState::Open);
    pump(&mut client, &mut events).await;

    let bodies: Vec<_> = client
        .display()
        .messages()
        .iter()
        .map(|m| m.message.body.as_str())
        .collect();
    assert_eq!(bodies, ["early"]);
}

#[tokio::test]
async fn server_close_ends_the_channel_once() {
    // A peer that says goodbye and closes the socket
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::Text("bye".into())).await.unwrap();
        let _ = ws.close(None).await;
        while ws.next().await.is_some() {}
    });

    let (mut client, mut events) = client_for(&format!("ws://{}/chat", addr));
    pump(&mut client, &mut events).await;
    assert_eq!(client.state(), ConnectionState::Open);
    pump(&mut client, &mut events).await;
    assert_eq!(client.display().messages().len(), 1);

    pump(&mut client, &mut events).await;
    assert_eq!(client.state(), ConnectionState::Closed);
    assert_eq!(client.display().status().label(), "Disconnected");

    // Exactly one Closed: the stream ends right after it
    let next = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("event stream stayed open");
    assert!(next.is_none());

    let mut channel = client.channel().clone();
    assert!(matches!(
        channel.transmit("late".to_string()),
        Err(ChatError::ChannelClosed)
    ));
}
