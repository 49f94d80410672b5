pub mod config;

use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use chat_shared::{ChatHistory, Message};
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use config::AppConfig;

const BROADCAST_CAPACITY: usize = 64;

pub struct AppState {
    config: AppConfig,
    history: Mutex<ChatHistory>,
    room: broadcast::Sender<String>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Arc<Self> {
        let history = match &config.history_file {
            Some(path) => load_history(path).await,
            None => ChatHistory::default(),
        };
        let (room, _) = broadcast::channel(BROADCAST_CAPACITY);

        Arc::new(Self {
            config,
            history: Mutex::new(history),
            room,
        })
    }

    pub fn history(&self) -> ChatHistory {
        match self.history.lock() {
            Ok(history) => history.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record(&self, message: Message) {
        let mut history = match self.history.lock() {
            Ok(history) => history,
            Err(poisoned) => poisoned.into_inner(),
        };
        history.messages.push(message);

        if let Some(path) = &self.config.history_file {
            match serde_json::to_string(&*history) {
                Ok(json) => {
                    if let Err(e) = std::fs::write(path, json) {
                        tracing::warn!("Failed to save history to {}: {}", path.display(), e);
                    }
                }
                Err(e) => tracing::warn!("Failed to serialize history: {}", e),
            }
        }
    }
}

async fn load_history(path: &Path) -> ChatHistory {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable history {}: {}", path.display(), e);
            ChatHistory::default()
        }),
        Err(_) => ChatHistory::default(),
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/chat", get(ws_handler))
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("listening on {}", addr);
    }
    axum::serve(listener, router(state)).await
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    tracing::info!("client connected");

    // Subscribe before greeting so a client that saw the greeting sees the room
    let mut room = state.room.subscribe();
    if let Some(greeting) = &state.config.greeting {
        if sender
            .send(WsMessage::Text(greeting.clone().into()))
            .await
            .is_err()
        {
            return;
        }
    }

    // Forward everything said in the room to this client
    let mut forward = tokio::spawn(async move {
        loop {
            match room.recv().await {
                Ok(frame) => {
                    if sender.send(WsMessage::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("client lagging, skipped {} frames", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let receive_state = state;
    let mut receive = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                WsMessage::Text(text) => {
                    tracing::debug!("received: {}", text.as_str());
                    let body = text.to_string();
                    let reply = format!("{}{}", receive_state.config.reply_prefix, body);

                    receive_state.record(Message::user(body));
                    receive_state.record(Message::bot(reply.clone()));
                    // No subscribers only means the room is empty
                    let _ = receive_state.room.send(reply);
                }
                WsMessage::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut forward => receive.abort(),
        _ = &mut receive => forward.abort(),
    }

    tracing::info!("client disconnected");
}
